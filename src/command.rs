//! Line-oriented command protocol.
//!
//! A client sends `command [operand...]\n`; the server answers with one JSON
//! object per line. Every response carries `command` and `result` (`OK` or
//! `ERROR`); the rest is command specific. Keys keep insertion order.
//!
//! ```text
//! > status
//! < {"command":"status","result":"OK"}
//! > foobar
//! < {"command":"foobar","result":"ERROR","messages":"Unrecognized command"}
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::error::Result;
use crate::handler::CommandProcessor;

pub const OK_RESPONSE: &str = "OK";
pub const ERROR_RESPONSE: &str = "ERROR";
pub const CLOSED_STATE: &str = "CLOSED";
pub const END_RESPONSE_DELIMITER: &str = "\n";

#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    fields: Map<String, Value>,
}

impl Response {
    pub fn new(command: impl Into<String>) -> Self {
        let mut fields = Map::new();
        fields.insert("command".into(), Value::String(command.into()));
        Self { fields }
    }

    pub fn ok(command: impl Into<String>) -> Self {
        let mut r = Self::new(command);
        r.set_result(OK_RESPONSE);
        r
    }

    pub fn error(command: impl Into<String>, message: impl Into<String>) -> Self {
        let mut r = Self::new(command);
        r.set_result(ERROR_RESPONSE);
        r.set_value("messages", Value::String(message.into()));
        r
    }

    pub fn set_result(&mut self, result: &str) {
        self.fields.insert("result".into(), Value::String(result.into()));
    }

    pub fn set_state(&mut self, state: &str) {
        self.fields.insert("state".into(), Value::String(state.into()));
    }

    pub fn set_value(&mut self, key: &str, value: impl Into<Value>) {
        self.fields.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn command(&self) -> &str {
        self.fields
            .get("command")
            .and_then(Value::as_str)
            .unwrap_or_default()
    }

    /// True once a handler has asked for the connection to be closed.
    pub fn is_closed(&self) -> bool {
        self.fields.get("state").and_then(Value::as_str) == Some(CLOSED_STATE)
    }

    /// Serialized form, newline included.
    pub fn to_line(&self) -> String {
        let mut line = Value::Object(self.fields.clone()).to_string();
        line.push_str(END_RESPONSE_DELIMITER);
        line
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_line())
    }
}

/// Handler signature: lower-cased tokens (command first) plus the raw line.
pub type CommandFn = Arc<dyn Fn(&[String], &str) -> Result<Response> + Send + Sync>;

/// Named command handlers for the text protocol.
///
/// The set must always contain a command that yields [`CLOSED_STATE`] so a
/// client has a way to end its session; [`CommandRegistry::default`] ships
/// with `close`.
#[derive(Clone)]
pub struct CommandRegistry {
    commands: HashMap<String, CommandFn>,
}

impl fmt::Debug for CommandRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.commands.keys().collect();
        names.sort();
        f.debug_struct("CommandRegistry").field("commands", &names).finish()
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register("status", status_command);
        registry.register("test", test_command);
        registry.register("close", close_command);
        registry
    }
}

impl CommandRegistry {
    pub fn empty() -> Self {
        Self {
            commands: HashMap::new(),
        }
    }

    /// Add or replace a command. Names are matched lower-cased.
    pub fn register<F>(&mut self, name: &str, handler: F)
    where
        F: Fn(&[String], &str) -> Result<Response> + Send + Sync + 'static,
    {
        self.commands.insert(name.to_lowercase(), Arc::new(handler));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.commands.contains_key(&name.to_lowercase())
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.commands.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

pub fn tokenize(line: &str) -> Vec<String> {
    line.to_lowercase()
        .split_whitespace()
        .map(str::to_owned)
        .collect()
}

impl CommandProcessor for CommandRegistry {
    fn execute(&self, line: &str) -> Result<Response> {
        let tokens = tokenize(line);

        // An empty line has no command token; echo an empty name.
        let Some(name) = tokens.first() else {
            return Ok(Response::error("", "Unrecognized command"));
        };

        match self.commands.get(name) {
            Some(handler) => handler(tokens.as_slice(), line),
            None => Ok(Response::error(name.as_str(), "Unrecognized command")),
        }
    }
}

fn status_command(tokens: &[String], _line: &str) -> Result<Response> {
    Ok(Response::ok(tokens[0].as_str()))
}

fn test_command(tokens: &[String], _line: &str) -> Result<Response> {
    let mut r = Response::ok(tokens[0].as_str());
    r.set_state("Doing nothing");
    r.set_value("arg1", "value of arg1");
    r.set_value("message", "This is an example test command");
    Ok(r)
}

fn close_command(tokens: &[String], _line: &str) -> Result<Response> {
    let mut r = Response::ok(tokens[0].as_str());
    r.set_state(CLOSED_STATE);
    Ok(r)
}
