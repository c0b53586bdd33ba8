#![cfg_attr(not(feature = "std"), no_std)]
extern crate alloc;

#[cfg(not(feature = "std"))]
mod std;

#[cfg(feature = "derive")]
use serde::Deserialize;

#[cfg(feature = "debug")]
use log::debug;

#[cfg(not(feature = "debug"))]
macro_rules! debug {
    ($($arg:tt)+) => {};
}

mod value;

use std::collections::{
    hash_map::Entry::{Occupied, Vacant},
    HashMap,
};
use std::fmt;
use std::str::FromStr;
use std::string::{String, ToString};
use std::vec::Vec;

use unicode_segmentation::UnicodeSegmentation;

pub use crate::value::Value;
use crate::value::cast_token;

#[derive(PartialEq, Debug)]
pub enum Error<'a> {
    UnknownArg(String),
    UnknownAction(String),
    MissingValue(&'a str),
    DuplicateArg(&'a str),
    WrongValueType(Value),
    WrongCastType(&'a str, String),
    UnexpectedValue(&'a str),
    UnexpectedPositional(String),
    Override(&'a str),
}

impl fmt::Display for Error<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::UnknownArg(arg) => write!(f, "unrecognized argument: {}", arg),
            Error::UnknownAction(action) => write!(f, "unknown action: {}", action),
            Error::MissingValue(name) => write!(f, "argument {} expects a value", name),
            Error::DuplicateArg(name) => write!(f, "argument {} is registered more than once", name),
            Error::WrongValueType(val) => write!(f, "unexpected value type: {:?}", val),
            Error::WrongCastType(name, val) => write!(f, "invalid value for {}: {}", name, val),
            Error::UnexpectedValue(name) => write!(f, "argument {} does not take a value", name),
            Error::UnexpectedPositional(val) => write!(f, "unexpected positional argument: {}", val),
            Error::Override(name) => write!(f, "argument {} was given more than once", name),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error<'_> {}

/// What happens when an argument's flag is found.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
#[cfg_attr(feature = "derive", derive(Deserialize), serde(rename_all = "snake_case"))]
pub enum Action {
    /// consume the next token (or an inline `--name=value`) as the value
    Store,
    /// set `true` when present, defaults to `false`
    StoreTrue,
    /// set `false` when present, defaults to `true`
    StoreFalse,
}

impl Default for Action {
    fn default() -> Self {
        Action::Store
    }
}

impl Action {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Action::Store => "store",
            Action::StoreTrue => "store_true",
            Action::StoreFalse => "store_false",
        }
    }

    fn implicit_default(self) -> Option<Value> {
        match self {
            Action::Store => None,
            Action::StoreTrue => Some(Value::Bool(false)),
            Action::StoreFalse => Some(Value::Bool(true)),
        }
    }
}

impl FromStr for Action {
    type Err = Error<'static>;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "store" => Ok(Action::Store),
            "store_true" => Ok(Action::StoreTrue),
            "store_false" => Ok(Action::StoreFalse),
            _ => Err(Error::UnknownAction(s.to_string())),
        }
    }
}

#[derive(Default, Clone, PartialEq, Debug)]
#[cfg_attr(feature = "derive", derive(Deserialize))]
pub struct Arg<'a> {
    // unique key (per parser), matched as --name and used as the results key
    pub name: &'a str,
    // second key we'll match this arg with e.g -v for --verbose
    #[cfg_attr(feature = "derive", serde(default, borrow))]
    pub alternative_name: Option<&'a str>,
    // value used when the arg isn't given. Its type decides how Store values are cast
    #[cfg_attr(feature = "derive", serde(default))]
    pub default: Option<Value>,
    #[cfg_attr(feature = "derive", serde(default))]
    pub action: Action,
    // info about this arg
    #[cfg_attr(feature = "derive", serde(default))]
    pub description: &'a str,
}

impl<'a> Arg<'a> {
    fn matches(&self, key: &str) -> bool {
        self.name == key || self.alternative_name == Some(key)
    }

    fn resolved_default(&self) -> Option<Value> {
        self.default.clone().or_else(|| self.action.implicit_default())
    }
}

/// A registry of [`Arg`]s and the characters that mark a token as a flag.
///
/// ```
/// use argstash::{Action, ArgumentParser, Value};
///
/// let mut parser = ArgumentParser::new("copies things");
/// parser
///     .add_argument("verbose", Some("v"), None, Action::StoreTrue, "say more")
///     .unwrap()
///     .add_argument("output", Some("o"), Some("out.txt".into()), Action::Store, "where to write")
///     .unwrap();
///
/// let results = parser.parse(vec!["-v"]).unwrap();
/// assert_eq!(Some(&Value::Bool(true)), results.get("verbose"));
/// assert_eq!(Some(&Value::from("out.txt")), results.get("output"));
/// ```
#[derive(Clone, PartialEq, Debug)]
#[cfg_attr(feature = "derive", derive(Deserialize))]
pub struct ArgumentParser<'a> {
    #[cfg_attr(feature = "derive", serde(default))]
    pub description: &'a str,
    // every grapheme in here is a valid flag prefix, e.g "-+"
    #[cfg_attr(feature = "derive", serde(default = "default_prefix_chars"))]
    pub prefix_chars: &'a str,
    #[cfg_attr(feature = "derive", serde(default, borrow))]
    pub args: Vec<Arg<'a>>,
    // reject flags given more than once instead of keeping the last value
    #[cfg_attr(feature = "derive", serde(default))]
    pub disable_overrides: bool,
}

fn default_prefix_chars<'a>() -> &'a str {
    "-"
}

impl<'a> Default for ArgumentParser<'a> {
    fn default() -> Self {
        ArgumentParser {
            description: Default::default(),
            prefix_chars: default_prefix_chars(),
            args: Default::default(),
            disable_overrides: Default::default(),
        }
    }
}

#[derive(Default, Clone, PartialEq, Debug)]
pub struct Results<'a> {
    pub values: HashMap<&'a str, Value>,
}

impl<'a> Results<'a> {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Typed access to a value, `None` if the arg was neither given nor defaulted.
    pub fn value<T>(&self, name: &str) -> Option<Result<T, Error<'static>>>
    where
        T: core::convert::TryFrom<Value, Error = Error<'static>>,
    {
        self.values.get(name).cloned().map(T::try_from)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

enum Token<'t> {
    Positional,
    EndOfOptions,
    Flag(&'t str),
}

impl<'a> ArgumentParser<'a> {
    pub fn new(description: &'a str) -> Self {
        ArgumentParser {
            description,
            ..Default::default()
        }
    }

    pub fn with_prefix_chars(mut self, prefix_chars: &'a str) -> Self {
        self.prefix_chars = prefix_chars;
        self
    }

    pub fn add_argument(
        &mut self,
        name: &'a str,
        alternative_name: Option<&'a str>,
        default: Option<Value>,
        action: Action,
        description: &'a str,
    ) -> Result<&mut Self, Error<'a>> {
        self.add_arg(Arg {
            name,
            alternative_name,
            default,
            action,
            description,
        })
    }

    /// Registers a Store arg with no alternative name and no default.
    pub fn add_simple_argument(&mut self, name: &'a str, description: &'a str) -> Result<&mut Self, Error<'a>> {
        self.add_arg(Arg {
            name,
            description,
            ..Default::default()
        })
    }

    pub fn add_arg(&mut self, arg: Arg<'a>) -> Result<&mut Self, Error<'a>> {
        if let Some(key) = Self::collision(&self.args, &arg) {
            debug!("rejecting {}, {} is already registered", arg.name, key);
            return Err(Error::DuplicateArg(key));
        }
        debug!("registering {} ({})", arg.name, arg.action.as_str());
        self.args.push(arg);
        Ok(self)
    }

    fn collision(existing: &[Arg<'a>], arg: &Arg<'a>) -> Option<&'a str> {
        let keys = core::iter::once(arg.name).chain(arg.alternative_name);
        for key in keys {
            if existing.iter().any(|a| a.matches(key)) {
                return Some(key);
            }
        }
        None
    }

    // parsers built from struct literals or deserialized never went through add_arg
    fn validate(&self) -> Result<(), Error<'a>> {
        for (i, arg) in self.args.iter().enumerate() {
            if let Some(key) = Self::collision(&self.args[..i], arg) {
                return Err(Error::DuplicateArg(key));
            }
        }
        Ok(())
    }

    fn find(&self, key: &str) -> Option<&Arg<'a>> {
        self.args.iter().find(|a| a.matches(key))
    }

    fn classify<'t>(&self, token: &'t str) -> Token<'t> {
        let mut end = 0;
        let mut prefixes = 0;
        for (i, g) in token.grapheme_indices(true) {
            if !self.prefix_chars.graphemes(true).any(|p| p == g) {
                break;
            }
            end = i + g.len();
            prefixes += 1;
        }
        match (prefixes, &token[end..]) {
            (0, _) | (1, "") => Token::Positional,
            (_, "") => Token::EndOfOptions,
            (_, flag) => Token::Flag(flag),
        }
    }

    fn try_insert(&self, key: &'a str, value: Value, out: &mut HashMap<&'a str, Value>) -> Result<(), Error<'a>> {
        match out.entry(key) {
            Occupied(_) if self.disable_overrides => Err(Error::Override(key)),
            Occupied(mut e) => {
                debug!("overriding {} = {:?} with {:?}", key, e.get(), value);
                e.insert(value);
                Ok(())
            }
            Vacant(e) => {
                e.insert(value);
                Ok(())
            }
        }
    }

    fn handle_flag<S: AsRef<str>, T: Iterator<Item = S>>(
        &self,
        flag: &str,
        tokens: &mut T,
        out: &mut HashMap<&'a str, Value>,
    ) -> Result<(), Error<'a>> {
        let (arg, inline) = self
            .find(flag)
            .map(|arg| (arg, None))
            .or_else(|| {
                let (key, value) = flag.split_once('=')?;
                self.find(key).map(|arg| (arg, Some(value)))
            })
            .ok_or_else(|| Error::UnknownArg(flag.to_string()))?;
        debug!("found arg {} for {}", arg.name, flag);
        let value = match (arg.action, inline) {
            (Action::Store, Some(raw)) => cast_token(arg.name, arg.default.as_ref(), raw)?,
            (Action::Store, None) => match tokens.next() {
                Some(raw) => cast_token(arg.name, arg.default.as_ref(), raw.as_ref())?,
                None => {
                    debug!("ran out of tokens looking for a value for {}", arg.name);
                    return Err(Error::MissingValue(arg.name));
                }
            },
            (_, Some(_)) => return Err(Error::UnexpectedValue(arg.name)),
            (action, None) => Value::Bool(action == Action::StoreTrue),
        };
        self.try_insert(arg.name, value, out)
    }

    fn handle_positional(&self, token: &str, out: &mut HashMap<&'a str, Value>) -> Result<(), Error<'a>> {
        let target = self
            .args
            .iter()
            .filter(|a| a.action == Action::Store)
            .find(|a| !out.contains_key(a.name));
        match target {
            Some(arg) => {
                debug!("assigning positional {} to {}", token, arg.name);
                let value = cast_token(arg.name, arg.default.as_ref(), token)?;
                out.insert(arg.name, value);
                Ok(())
            }
            None => Err(Error::UnexpectedPositional(token.to_string())),
        }
    }

    /// Parses `tokens`, which must not include the program name.
    pub fn parse<S: AsRef<str>, T: IntoIterator<Item = S>>(&self, tokens: T) -> Result<Results<'a>, Error<'a>> {
        debug!("starting arg parsing for {}", self.description);
        self.validate()?;
        let mut values = HashMap::with_capacity(self.args.len());
        let mut positional = Vec::with_capacity(0);
        let mut tokens = tokens.into_iter();
        while let Some(token) = tokens.next() {
            let token = token.as_ref();
            match self.classify(token) {
                Token::Flag(flag) => self.handle_flag(flag, &mut tokens, &mut values)?,
                Token::Positional => positional.push(token.to_string()),
                Token::EndOfOptions => {
                    debug!("found {}, treating everything after as positional", token);
                    (&mut tokens).for_each(|rest| positional.push(rest.as_ref().to_string()));
                }
            }
        }
        // flags win, positionals only go to Store args no flag filled
        for token in &positional {
            self.handle_positional(token, &mut values)?;
        }
        debug!("finished looping through args, filling in defaults");
        for arg in &self.args {
            if let Vacant(e) = values.entry(arg.name) {
                if let Some(default) = arg.resolved_default() {
                    debug!("using default value for {}", arg.name);
                    e.insert(default);
                }
            }
        }
        Ok(Results { values })
    }

    /// Parses a full argument vector as handed to the process, skipping the program name.
    pub fn parse_args<S: AsRef<str>, T: IntoIterator<Item = S>>(&self, argv: T) -> Result<Results<'a>, Error<'a>> {
        self.parse(argv.into_iter().skip(1))
    }

    #[cfg(feature = "std")]
    pub fn parse_env(&self) -> Result<Results<'a>, Error<'a>> {
        self.parse_args(arguments(std::env::args_os()))
    }
}

/// Converts an OS argument vector into owned tokens, replacing invalid unicode.
#[cfg(feature = "std")]
pub fn arguments<S: AsRef<std::ffi::OsStr>, T: IntoIterator<Item = S>>(argv: T) -> Vec<String> {
    argv.into_iter().map(|a| a.as_ref().to_string_lossy().into_owned()).collect()
}
