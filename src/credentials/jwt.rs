use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::Serialize;

use crate::error::{internal_error, FirestoreResult};

/// Signs the `header.payload` portion of a JWT assertion.
///
/// The crate assembles and exchanges the assertion but carries no RSA
/// primitive; callers plug in their signature implementation here.
pub trait JwtSigner: Send + Sync + 'static {
    /// JOSE algorithm name written into the header, e.g. `RS256`.
    fn algorithm(&self) -> &'static str;

    /// Produces the raw signature over `message`.
    fn sign(&self, message: &[u8]) -> FirestoreResult<Vec<u8>>;
}

#[derive(Serialize)]
struct Header<'a> {
    alg: &'a str,
    typ: &'static str,
}

#[derive(Serialize)]
pub(crate) struct Claims {
    pub iss: String,
    pub scope: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
}

pub(crate) fn build_assertion(claims: &Claims, signer: &dyn JwtSigner) -> FirestoreResult<String> {
    let header = Header {
        alg: signer.algorithm(),
        typ: "JWT",
    };
    let header_json =
        serde_json::to_string(&header).map_err(|err| internal_error(err.to_string()))?;
    let claims_json =
        serde_json::to_string(claims).map_err(|err| internal_error(err.to_string()))?;

    let message = format!(
        "{}.{}",
        URL_SAFE_NO_PAD.encode(header_json),
        URL_SAFE_NO_PAD.encode(claims_json)
    );
    let signature = signer.sign(message.as_bytes())?;
    Ok(format!("{message}.{}", URL_SAFE_NO_PAD.encode(signature)))
}
