use serde_json::{json, Value as JsonValue};

use crate::codec::encode_value;
use crate::query::builder::{FieldFilter, StructuredQuery};

pub(crate) fn encode_structured_query(query: &StructuredQuery) -> JsonValue {
    let mut structured = serde_json::Map::new();

    structured.insert(
        "from".to_string(),
        json!([{ "collectionId": query.collection_id }]),
    );

    let filters: Vec<_> = query.filters.iter().map(encode_field_filter).collect();
    structured.insert(
        "where".to_string(),
        json!({
            "compositeFilter": {
                "op": "AND",
                "filters": filters
            }
        }),
    );

    if !query.order_by.is_empty() {
        let orders: Vec<_> = query
            .order_by
            .iter()
            .map(|order| {
                json!({
                    "field": { "fieldPath": order.field().canonical_string() },
                    "direction": order.direction().as_str(),
                })
            })
            .collect();
        structured.insert("orderBy".to_string(), JsonValue::Array(orders));
    }

    if let Some(limit) = query.limit {
        structured.insert("limit".to_string(), json!(limit));
    }

    if let Some(offset) = query.offset {
        structured.insert("offset".to_string(), json!(offset));
    }

    if !query.start_at.is_empty() {
        structured.insert(
            "startAt".to_string(),
            encode_cursor(&query.start_at, true),
        );
    }

    if !query.end_at.is_empty() {
        structured.insert("endAt".to_string(), encode_cursor(&query.end_at, false));
    }

    JsonValue::Object(structured)
}

fn encode_field_filter(filter: &FieldFilter) -> JsonValue {
    json!({
        "fieldFilter": {
            "field": { "fieldPath": filter.field().canonical_string() },
            "op": filter.operator().as_str(),
            "value": encode_value(filter.value())
        }
    })
}

// Both cursors are inclusive: startAt positions before the anchor, endAt
// after it.
fn encode_cursor(values: &[crate::value::Value], start: bool) -> JsonValue {
    json!({
        "values": values.iter().map(encode_value).collect::<Vec<_>>(),
        "before": start,
    })
}

#[cfg(test)]
mod tests {
    use crate::query::QueryBuilder;
    use serde_json::json;

    #[test]
    fn encodes_full_request_body() {
        let body = QueryBuilder::new("users")
            .equal([("account", "2")])
            .greater_than([("age", 21i64)])
            .descending(["age"])
            .limit(10)
            .offset(5)
            .into_search()
            .unwrap()
            .request_body();

        assert_eq!(
            body,
            json!({
                "structuredQuery": {
                    "from": [ { "collectionId": "users" } ],
                    "where": {
                        "compositeFilter": {
                            "op": "AND",
                            "filters": [
                                {
                                    "fieldFilter": {
                                        "field": { "fieldPath": "account" },
                                        "op": "EQUAL",
                                        "value": { "stringValue": "2" }
                                    }
                                },
                                {
                                    "fieldFilter": {
                                        "field": { "fieldPath": "age" },
                                        "op": "GREATER_THAN",
                                        "value": { "integerValue": "21" }
                                    }
                                }
                            ]
                        }
                    },
                    "orderBy": [
                        { "field": { "fieldPath": "age" }, "direction": "DESCENDING" }
                    ],
                    "limit": 10,
                    "offset": 5
                }
            })
        );
    }

    #[test]
    fn encodes_cursors_with_before_markers() {
        let body = QueryBuilder::new("users")
            .equal([("account", "2")])
            .ascending(["age"])
            .start_at(21i64)
            .end_at(65i64)
            .into_search()
            .unwrap()
            .request_body();

        assert_eq!(
            body["structuredQuery"]["startAt"],
            json!({ "values": [ { "integerValue": "21" } ], "before": true })
        );
        assert_eq!(
            body["structuredQuery"]["endAt"],
            json!({ "values": [ { "integerValue": "65" } ], "before": false })
        );
    }

    #[test]
    fn single_filter_still_composited() {
        let body = QueryBuilder::new("users")
            .equal([("account", "2")])
            .into_search()
            .unwrap()
            .request_body();
        assert!(body["structuredQuery"]["where"]["compositeFilter"].is_object());
    }
}
