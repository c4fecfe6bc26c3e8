//! Script-facing surface of the response object.
//!
//! A scripting engine binds a [`HostObject`] as a global (conventionally
//! `res`) and forwards method calls and property access to it. Argument
//! marshalling into [`ScriptValue`]s is the engine's job.
//!
//! | script                          | host call                         |
//! |---------------------------------|-----------------------------------|
//! | `res.write(a, b)`               | `call("write", [a, b])`           |
//! | `res.writeln(a)`                | `call("writeln", [a])`            |
//! | `res.setCookie(n, v, d, p, dom)`| `call("setCookie", [...])`        |
//! | `res.redirect(url)`             | `call("redirect", [url])`         |
//! | `res.push()` / `res.pop()`      | `call("push")` / `call("pop")`    |
//! | `res.contentType`               | `get` / `set("contentType", ...)` |
//!
//! The raw transport is not reachable from script. A [`ScriptValue`] cannot
//! carry a native handle, so `getNativeObject` is an unknown member here and
//! privileged host code uses [`ResponseBuffer::with_transport`] instead.

use crate::buffer::ResponseBuffer;
use crate::error::{PageResult, ResponseError, ResponseResult};
use crate::transport::Transport;
use crate::value::ScriptValue;

/// An object exposed to script code by name.
pub trait HostObject {
    fn class_name(&self) -> &'static str;

    /// Invoke a method. May unwind with a redirect.
    fn call(&self, method: &str, args: &[ScriptValue]) -> PageResult<ScriptValue>;

    fn get(&self, property: &str) -> ResponseResult<ScriptValue>;

    fn set(&self, property: &str, value: ScriptValue) -> ResponseResult<()>;
}

const CLASS_NAME: &str = "Response";

impl<T: Transport> HostObject for ResponseBuffer<T> {
    fn class_name(&self) -> &'static str {
        CLASS_NAME
    }

    fn call(&self, method: &str, args: &[ScriptValue]) -> PageResult<ScriptValue> {
        tracing::trace!(method, argc = args.len(), "response host call");
        match method {
            "write" => self.write(args)?,
            "writeln" => self.writeln(args)?,
            "setCookie" => self.set_cookie_args(args)?,
            "push" => self.push(),
            "pop" => return Ok(ScriptValue::String(self.pop()?)),
            "redirect" => {
                let target = match args {
                    [ScriptValue::String(target)] => target.clone(),
                    [other] => {
                        return Err(ResponseError::ArgumentType {
                            position: 1,
                            expected: "string",
                            found: other.type_name(),
                        }
                        .into());
                    }
                    _ => {
                        return Err(ResponseError::InvalidArguments(format!(
                            "redirect() takes exactly 1 argument, got {}",
                            args.len()
                        ))
                        .into());
                    }
                };
                return self.redirect(target);
            }
            _ => {
                return Err(ResponseError::UnknownMember {
                    class: CLASS_NAME,
                    name: method.to_string(),
                }
                .into());
            }
        }
        Ok(ScriptValue::Undefined)
    }

    fn get(&self, property: &str) -> ResponseResult<ScriptValue> {
        match property {
            "contentType" => Ok(self.content_type().into()),
            _ => Err(ResponseError::UnknownMember {
                class: CLASS_NAME,
                name: property.to_string(),
            }),
        }
    }

    fn set(&self, property: &str, value: ScriptValue) -> ResponseResult<()> {
        match property {
            "contentType" => match value {
                ScriptValue::String(content_type) => {
                    self.set_content_type(&content_type);
                    Ok(())
                }
                other => Err(ResponseError::ArgumentType {
                    position: 1,
                    expected: "string",
                    found: other.type_name(),
                }),
            },
            _ => Err(ResponseError::UnknownMember {
                class: CLASS_NAME,
                name: property.to_string(),
            }),
        }
    }
}
