//! Request identity.
//!
//! Authentication happens upstream (device login, reverse proxy). This layer
//! only turns the asserted identity headers into a [`PrincipalContext`].

use axum::{
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};

use rodstock_auth::{PrincipalId, Role};

use crate::app::errors::json_error;
use crate::context::PrincipalContext;

pub const OPERATOR_ID_HEADER: &str = "x-operator-id";
pub const OPERATOR_NAME_HEADER: &str = "x-operator-name";
pub const ROLES_HEADER: &str = "x-roles";

pub async fn identity_middleware(
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Result<Response, Response> {
    let context = principal_from_headers(req.headers())
        .map_err(|msg| json_error(StatusCode::UNAUTHORIZED, "unauthorized", msg))?;

    tracing::debug!(
        principal = %context.principal_id(),
        roles = ?context.roles().iter().map(|r| r.as_str()).collect::<Vec<_>>(),
        "request identity"
    );
    req.extensions_mut().insert(context);

    Ok(next.run(req).await)
}

fn principal_from_headers(headers: &HeaderMap) -> Result<PrincipalContext, String> {
    let raw_id = header_str(headers, OPERATOR_ID_HEADER)
        .ok_or_else(|| format!("missing {OPERATOR_ID_HEADER} header"))?;
    let principal_id: PrincipalId = raw_id
        .parse()
        .map_err(|_| format!("{OPERATOR_ID_HEADER} is not a valid id"))?;

    let name = header_str(headers, OPERATOR_NAME_HEADER)
        .map(str::to_string)
        .unwrap_or_else(|| principal_id.to_string());

    let roles = header_str(headers, ROLES_HEADER)
        .map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|r| !r.is_empty())
                .map(|r| Role::new(r.to_ascii_lowercase()))
                .collect()
        })
        .unwrap_or_default();

    Ok(PrincipalContext::new(principal_id, name, roles))
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(&'static str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (k, v) in pairs {
            map.insert(*k, HeaderValue::from_str(v).unwrap());
        }
        map
    }

    #[test]
    fn parses_identity_and_roles() {
        let id = PrincipalId::new();
        let ctx = principal_from_headers(&headers(&[
            (OPERATOR_ID_HEADER, &id.to_string()),
            (OPERATOR_NAME_HEADER, "Joana"),
            (ROLES_HEADER, "Operator, supervisor,,"),
        ]))
        .unwrap();

        assert_eq!(ctx.principal_id(), id);
        assert_eq!(ctx.name(), "Joana");
        assert_eq!(ctx.roles(), &[Role::OPERATOR, Role::SUPERVISOR]);
    }

    #[test]
    fn missing_or_bad_id_is_rejected() {
        assert!(principal_from_headers(&HeaderMap::new()).is_err());
        assert!(principal_from_headers(&headers(&[(OPERATOR_ID_HEADER, "nope")])).is_err());
    }

    #[test]
    fn name_defaults_to_id() {
        let id = PrincipalId::new();
        let ctx = principal_from_headers(&headers(&[(OPERATOR_ID_HEADER, &id.to_string())])).unwrap();
        assert_eq!(ctx.name(), id.to_string());
        assert!(ctx.roles().is_empty());
    }
}
