//! Cookie descriptors and their validated construction.

use std::fmt::Write as _;

use crate::error::{ResponseError, ResponseResult};
use crate::value::ScriptValue;

pub const DEFAULT_COOKIE_PATH: &str = "/";
pub const SECONDS_PER_DAY: i64 = 60 * 60 * 24;

/// Attribute names a cookie may not take, compared case-insensitively.
const RESERVED_NAMES: &[&str] = &[
    "comment", "discard", "domain", "expires", "httponly", "max-age", "path", "samesite",
    "secure", "version",
];

/// Cookie handed to the transport. Not retained after the append.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    /// `None` for a session cookie, `Some(0)` to expire immediately.
    pub max_age: Option<i64>,
    pub path: String,
    pub domain: Option<String>,
}

/// Optional cookie settings.
///
/// ```
/// use quill_response::CookieOptions;
///
/// let opts = CookieOptions::new().ttl_days(7).path("/app");
/// assert_eq!(opts.ttl_days, Some(7));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CookieOptions {
    /// Days the client keeps the cookie. Negative or `None` means session,
    /// zero means expire immediately.
    pub ttl_days: Option<i64>,
    /// Defaults to `/`.
    pub path: Option<String>,
    /// Defaults to unset, leaving the choice to the client.
    pub domain: Option<String>,
}

impl CookieOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ttl_days(self, days: i64) -> Self {
        Self {
            ttl_days: Some(days),
            ..self
        }
    }

    /// Shorthand for `ttl_days(0)`, used to delete a cookie the client holds.
    pub fn expire_now(self) -> Self {
        self.ttl_days(0)
    }

    pub fn path(self, path: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
            ..self
        }
    }

    pub fn domain(self, domain: impl Into<String>) -> Self {
        Self {
            domain: Some(domain.into()),
            ..self
        }
    }
}

impl Cookie {
    /// Validate and assemble a cookie.
    pub fn build(
        name: impl Into<String>,
        value: impl Into<String>,
        options: CookieOptions,
    ) -> ResponseResult<Cookie> {
        let name = name.into();
        let value = value.into();
        validate_name(&name)?;
        if let Some(bad) = value.chars().find(|&c| !is_cookie_octet(c)) {
            return Err(ResponseError::InvalidArguments(format!(
                "cookie {name:?} value contains forbidden character {bad:?}"
            )));
        }
        if let Some(path) = &options.path {
            validate_attribute("path", path)?;
        }
        if let Some(domain) = &options.domain {
            validate_attribute("domain", domain)?;
        }

        let max_age = match options.ttl_days {
            Some(days) if days >= 0 => Some(days.checked_mul(SECONDS_PER_DAY).ok_or_else(|| {
                ResponseError::InvalidArguments(format!("cookie lifetime of {days} days is too large"))
            })?),
            _ => None,
        };

        Ok(Cookie {
            name,
            value,
            max_age,
            path: options.path.unwrap_or_else(|| DEFAULT_COOKIE_PATH.to_string()),
            domain: options.domain,
        })
    }

    /// Build a cookie from script call arguments:
    /// `(name, value[, days[, path[, domain]]])`.
    ///
    /// `null`/`undefined` in an optional slot means "use the default".
    pub fn from_script_args(args: &[ScriptValue]) -> ResponseResult<Cookie> {
        if !(2..=5).contains(&args.len()) {
            return Err(ResponseError::InvalidArguments(format!(
                "setCookie() requires between 2 and 5 arguments, got {}",
                args.len()
            )));
        }

        let name = string_arg(args, 0)?.ok_or_else(|| {
            ResponseError::InvalidArguments("cookie name must not be null".to_string())
        })?;
        let value = string_arg(args, 1)?.unwrap_or_default();
        let options = CookieOptions {
            ttl_days: int_arg(args, 2)?,
            path: string_arg(args, 3)?,
            domain: string_arg(args, 4)?,
        };
        Cookie::build(name, value, options)
    }

    pub fn is_session(&self) -> bool {
        self.max_age.is_none()
    }

    /// Render as a `Set-Cookie` header value.
    pub fn to_header_value(&self) -> String {
        let mut out = format!("{}={}", self.name, self.value);
        if let Some(max_age) = self.max_age {
            let _ = write!(out, "; Max-Age={max_age}");
        }
        let _ = write!(out, "; Path={}", self.path);
        if let Some(domain) = &self.domain {
            let _ = write!(out, "; Domain={domain}");
        }
        out
    }
}

fn validate_name(name: &str) -> ResponseResult<()> {
    if name.is_empty() {
        return Err(ResponseError::InvalidArguments(
            "cookie name must not be empty".to_string(),
        ));
    }
    if let Some(bad) = name.chars().find(|&c| !is_token_char(c)) {
        return Err(ResponseError::InvalidArguments(format!(
            "cookie name {name:?} contains forbidden character {bad:?}"
        )));
    }
    if name.starts_with('$') || RESERVED_NAMES.iter().any(|r| r.eq_ignore_ascii_case(name)) {
        return Err(ResponseError::InvalidArguments(format!(
            "cookie name {name:?} is reserved"
        )));
    }
    Ok(())
}

fn validate_attribute(attribute: &str, value: &str) -> ResponseResult<()> {
    match value.chars().find(|&c| c == ';' || c.is_control()) {
        Some(bad) => Err(ResponseError::InvalidArguments(format!(
            "cookie {attribute} {value:?} contains forbidden character {bad:?}"
        ))),
        None => Ok(()),
    }
}

/// RFC 6265 `token`: visible ASCII minus separators.
fn is_token_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || "!#$%&'*+-.^_`|~".contains(c)
}

/// RFC 6265 `cookie-octet`: visible ASCII minus `"` `,` `;` `\`.
fn is_cookie_octet(c: char) -> bool {
    c.is_ascii_graphic() && !matches!(c, '"' | ',' | ';' | '\\')
}

fn string_arg(args: &[ScriptValue], pos: usize) -> ResponseResult<Option<String>> {
    match args.get(pos) {
        None => Ok(None),
        Some(v) if v.is_nullish() => Ok(None),
        Some(ScriptValue::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(ResponseError::ArgumentType {
            position: pos + 1,
            expected: "string",
            found: other.type_name(),
        }),
    }
}

/// Numeric argument truncated toward zero; non-finite values map to zero.
fn int_arg(args: &[ScriptValue], pos: usize) -> ResponseResult<Option<i64>> {
    match args.get(pos) {
        None => Ok(None),
        Some(v) if v.is_nullish() => Ok(None),
        Some(ScriptValue::Number(n)) => Ok(Some(if n.is_finite() { n.trunc() as i64 } else { 0 })),
        Some(other) => Err(ResponseError::ArgumentType {
            position: pos + 1,
            expected: "number",
            found: other.type_name(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(values: Vec<ScriptValue>) -> Vec<ScriptValue> {
        values
    }

    #[test]
    fn two_args_give_session_cookie_at_root() {
        let cookie = Cookie::from_script_args(&args(vec!["a".into(), "b".into()])).unwrap();
        assert_eq!(cookie.name, "a");
        assert_eq!(cookie.value, "b");
        assert!(cookie.is_session());
        assert_eq!(cookie.path, "/");
        assert_eq!(cookie.domain, None);
    }

    #[test]
    fn zero_days_expires_immediately() {
        let cookie = Cookie::from_script_args(&args(vec!["a".into(), "b".into(), 0.into()])).unwrap();
        assert_eq!(cookie.max_age, Some(0));
    }

    #[test]
    fn days_convert_to_seconds() {
        let cookie = Cookie::from_script_args(&args(vec!["a".into(), "b".into(), 2.into()])).unwrap();
        assert_eq!(cookie.max_age, Some(172_800));
    }

    #[test]
    fn negative_days_mean_session() {
        let cookie = Cookie::build("a", "b", CookieOptions::new().ttl_days(-1)).unwrap();
        assert!(cookie.is_session());
    }

    #[test]
    fn fractional_days_truncate() {
        let cookie =
            Cookie::from_script_args(&args(vec!["a".into(), "b".into(), 1.9.into()])).unwrap();
        assert_eq!(cookie.max_age, Some(SECONDS_PER_DAY));
    }

    #[test]
    fn path_and_domain_positional() {
        let cookie = Cookie::from_script_args(&args(vec![
            "a".into(),
            "b".into(),
            ScriptValue::Null,
            "/app".into(),
            "example.com".into(),
        ]))
        .unwrap();
        assert!(cookie.is_session());
        assert_eq!(cookie.path, "/app");
        assert_eq!(cookie.domain.as_deref(), Some("example.com"));
    }

    #[test]
    fn null_value_becomes_empty() {
        let cookie = Cookie::from_script_args(&args(vec!["a".into(), ScriptValue::Null])).unwrap();
        assert_eq!(cookie.value, "");
    }

    #[test]
    fn too_few_arguments() {
        let err = Cookie::from_script_args(&args(vec!["a".into()])).unwrap_err();
        assert!(matches!(err, ResponseError::InvalidArguments(_)));
    }

    #[test]
    fn too_many_arguments() {
        let six = vec![ScriptValue::from("x"); 6];
        let err = Cookie::from_script_args(&six).unwrap_err();
        assert!(err.to_string().contains("between 2 and 5"));
    }

    #[test]
    fn null_name_rejected() {
        let err = Cookie::from_script_args(&args(vec![ScriptValue::Null, "b".into()])).unwrap_err();
        assert!(err.is_precondition());
    }

    #[test]
    fn empty_name_rejected() {
        let err = Cookie::build("", "b", CookieOptions::default()).unwrap_err();
        assert!(matches!(err, ResponseError::InvalidArguments(_)));
    }

    #[test]
    fn wrong_ttl_type_names_position_three() {
        let err = Cookie::from_script_args(&args(vec!["a".into(), "b".into(), "2".into()]))
            .unwrap_err();
        assert!(matches!(
            err,
            ResponseError::ArgumentType { position: 3, expected: "number", found: "string" }
        ));
    }

    #[test]
    fn wrong_name_type_names_position_one() {
        let err = Cookie::from_script_args(&args(vec![1.into(), "b".into()])).unwrap_err();
        assert!(matches!(err, ResponseError::ArgumentType { position: 1, .. }));
    }

    #[test]
    fn wrong_domain_type_names_position_five() {
        let err = Cookie::from_script_args(&args(vec![
            "a".into(),
            "b".into(),
            1.into(),
            "/".into(),
            true.into(),
        ]))
        .unwrap_err();
        assert!(matches!(err, ResponseError::ArgumentType { position: 5, found: "boolean", .. }));
    }

    #[test]
    fn huge_ttl_rejected() {
        let err = Cookie::build("a", "b", CookieOptions::new().ttl_days(i64::MAX)).unwrap_err();
        assert!(matches!(err, ResponseError::InvalidArguments(_)));
    }

    #[test]
    fn value_cannot_smuggle_attributes() {
        let err = Cookie::from_script_args(&args(vec![
            "sid".into(),
            "x; Domain=evil.example; Max-Age=999999".into(),
        ]))
        .unwrap_err();
        assert!(matches!(err, ResponseError::InvalidArguments(_)));

        for value in ["a b", "a,b", "\"quoted\"", "tab\there", "back\\slash", "caf\u{e9}"] {
            assert!(
                Cookie::build("sid", value, CookieOptions::default()).is_err(),
                "{value:?} accepted"
            );
        }
    }

    #[test]
    fn name_must_be_a_token() {
        for name in ["a=b; Path", "a b", "a;b", "a\"b", "(x)", "n\r\n"] {
            let err = Cookie::build(name, "v", CookieOptions::default()).unwrap_err();
            assert!(matches!(err, ResponseError::InvalidArguments(_)), "{name:?} accepted");
        }
    }

    #[test]
    fn reserved_names_rejected() {
        for name in ["Path", "max-age", "DOMAIN", "Expires", "$Version"] {
            let err = Cookie::build(name, "v", CookieOptions::default()).unwrap_err();
            assert!(err.to_string().contains("reserved"), "{name:?} accepted");
        }
    }

    #[test]
    fn path_and_domain_cannot_add_attributes() {
        assert!(Cookie::build("a", "b", CookieOptions::new().path("/; Secure")).is_err());
        assert!(Cookie::build("a", "b", CookieOptions::new().domain("x.com\r\nSet-Cookie: y=1")).is_err());
    }

    #[test]
    fn token_names_and_plain_values_accepted() {
        let value = "abc123!#$%&'()*+-./:<=>?@[]^_`{|}~";
        let cookie = Cookie::build("__Host-sid.v2", value, CookieOptions::default()).unwrap();
        assert_eq!(cookie.value, value);
        assert_eq!(cookie.name, "__Host-sid.v2");
        assert!(Cookie::build("sid", "", CookieOptions::default()).is_ok());
    }

    #[test]
    fn header_value_rendering() {
        let session = Cookie::build("sid", "abc", CookieOptions::default()).unwrap();
        assert_eq!(session.to_header_value(), "sid=abc; Path=/");

        let full = Cookie::build(
            "sid",
            "",
            CookieOptions::new().expire_now().path("/x").domain("example.com"),
        )
        .unwrap();
        assert_eq!(full.to_header_value(), "sid=; Max-Age=0; Path=/x; Domain=example.com");
    }
}
