//! # Streaming JSON Token Parser
//!
//! Walks a JSON document as a flat sequence of `(path, event)` tokens without
//! materializing it. wsperf result files carry one `connection_stats` entry
//! per simulated connection, so a full tree would grow with the size of the
//! load test; this walker keeps only the current path on its stack.
//!
//! ## Path Addressing
//!
//! Paths use dotted prefixes: object members append their key, array elements
//! append the literal segment `item`, and the document root is the empty path.
//!
//! ```text
//! {"started": 1, "connection_stats": [{"open": 7}]}
//!
//! ""                           start_map
//! ""                           map_key      started
//! "started"                    number       1
//! ""                           map_key      connection_stats
//! "connection_stats"           start_array
//! "connection_stats.item"      start_map
//! "connection_stats.item"      map_key      open
//! "connection_stats.item.open" number       7
//! "connection_stats.item"      end_map
//! "connection_stats"           end_array
//! ""                           end_map
//! ```
//!
//! ## Delivery
//!
//! Tokens are pushed into a [`TokenSink`] as the underlying
//! `serde_json::Deserializer` reads the input. A sink can stop the walk by
//! returning an error; that error is handed back unchanged from
//! [`parse_reader`]. Nesting depth is bounded by serde_json's recursion limit.

use crate::error::{AnalyzeError, Result};
use serde::de::{self, DeserializeSeed, MapAccess, SeqAccess, Visitor};
use serde_json::Number;
use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// One step of a [`JsonPath`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    /// Member of an object
    Key(String),
    /// Element of an array
    Item,
}

/// Structural address of a token inside the document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JsonPath {
    segments: Vec<PathSegment>,
}

impl JsonPath {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    fn push(&mut self, segment: PathSegment) {
        self.segments.push(segment);
    }

    fn pop(&mut self) {
        self.segments.pop();
    }
}

impl fmt::Display for JsonPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            match segment {
                PathSegment::Key(key) => f.write_str(key)?,
                PathSegment::Item => f.write_str("item")?,
            }
        }
        Ok(())
    }
}

/// Scalar payload of a token
#[derive(Debug, Clone, PartialEq)]
pub enum ScalarValue {
    Null,
    Boolean(bool),
    Number(Number),
    String(String),
}

/// Kind of token emitted by the walker
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    StartMap,
    EndMap,
    StartArray,
    EndArray,
    MapKey(String),
    Scalar(ScalarValue),
}

impl Event {
    /// Short name of the event, e.g. `start_map` or `number`
    pub fn name(&self) -> &'static str {
        match self {
            Event::StartMap => "start_map",
            Event::EndMap => "end_map",
            Event::StartArray => "start_array",
            Event::EndArray => "end_array",
            Event::MapKey(_) => "map_key",
            Event::Scalar(ScalarValue::Null) => "null",
            Event::Scalar(ScalarValue::Boolean(_)) => "boolean",
            Event::Scalar(ScalarValue::Number(_)) => "number",
            Event::Scalar(ScalarValue::String(_)) => "string",
        }
    }
}

/// Consumer of parser tokens
pub trait TokenSink {
    /// Handle one token. Returning an error aborts the parse.
    fn token(&mut self, path: &JsonPath, event: Event) -> Result<()>;
}

impl<T: TokenSink + ?Sized> TokenSink for &mut T {
    fn token(&mut self, path: &JsonPath, event: Event) -> Result<()> {
        (**self).token(path, event)
    }
}

/// Walk state shared by every level of the recursive descent
struct Walk<S> {
    path: JsonPath,
    sink: S,
    failure: Option<AnalyzeError>,
}

impl<S: TokenSink> Walk<S> {
    fn emit<E: de::Error>(&mut self, event: Event) -> Result<(), E> {
        match self.sink.token(&self.path, event) {
            Ok(()) => Ok(()),
            Err(err) => {
                self.failure = Some(err);
                Err(E::custom("token sink aborted the parse"))
            }
        }
    }
}

/// One JSON value at the current path
struct Node<'a, S> {
    walk: &'a mut Walk<S>,
}

impl<'de, S: TokenSink> DeserializeSeed<'de> for Node<'_, S> {
    type Value = ();

    fn deserialize<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
    where
        D: de::Deserializer<'de>,
    {
        deserializer.deserialize_any(self)
    }
}

impl<'de, S: TokenSink> Visitor<'de> for Node<'_, S> {
    type Value = ();

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("any JSON value")
    }

    fn visit_unit<E>(self) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        self.walk.emit(Event::Scalar(ScalarValue::Null))
    }

    fn visit_bool<E>(self, v: bool) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        self.walk.emit(Event::Scalar(ScalarValue::Boolean(v)))
    }

    fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        self.walk
            .emit(Event::Scalar(ScalarValue::Number(Number::from(v))))
    }

    fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        self.walk
            .emit(Event::Scalar(ScalarValue::Number(Number::from(v))))
    }

    fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        let number = Number::from_f64(v).ok_or_else(|| E::custom("non-finite number"))?;
        self.walk.emit(Event::Scalar(ScalarValue::Number(number)))
    }

    fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        self.walk
            .emit(Event::Scalar(ScalarValue::String(v.to_owned())))
    }

    fn visit_string<E>(self, v: String) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        self.walk.emit(Event::Scalar(ScalarValue::String(v)))
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
    where
        A: SeqAccess<'de>,
    {
        self.walk.emit::<A::Error>(Event::StartArray)?;
        self.walk.path.push(PathSegment::Item);
        while seq
            .next_element_seed(Node {
                walk: &mut *self.walk,
            })?
            .is_some()
        {}
        self.walk.path.pop();
        self.walk.emit(Event::EndArray)
    }

    fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        self.walk.emit::<A::Error>(Event::StartMap)?;
        while let Some(key) = map.next_key::<String>()? {
            self.walk.emit::<A::Error>(Event::MapKey(key.clone()))?;
            self.walk.path.push(PathSegment::Key(key));
            map.next_value_seed(Node {
                walk: &mut *self.walk,
            })?;
            self.walk.path.pop();
        }
        self.walk.emit(Event::EndMap)
    }
}

/// Stream every token of the JSON document read from `reader` into `sink`.
///
/// The reader is consumed exactly once; to walk a document again, reopen it.
/// Anything other than whitespace after the top-level value is an error.
pub fn parse_reader<R: Read, S: TokenSink>(reader: R, sink: S) -> Result<()> {
    let mut deserializer = serde_json::Deserializer::from_reader(reader);
    let mut walk = Walk {
        path: JsonPath::root(),
        sink,
        failure: None,
    };

    let outcome = Node { walk: &mut walk }
        .deserialize(&mut deserializer)
        .and_then(|()| deserializer.end());

    match outcome {
        Ok(()) => Ok(()),
        Err(err) => Err(walk.failure.take().unwrap_or_else(|| err.into())),
    }
}

/// Open `path` and stream its tokens into `sink`
///
/// Failures to open or read the file are reported as [`AnalyzeError::Io`]
/// naming `path`; malformed content is [`AnalyzeError::Parse`].
pub fn parse_file<S: TokenSink>(path: &Path, sink: S) -> Result<()> {
    let io_error = |source| AnalyzeError::Io {
        path: path.to_path_buf(),
        source,
    };
    let file = File::open(path).map_err(io_error)?;
    match parse_reader(BufReader::new(file), sink) {
        Err(AnalyzeError::Read(source)) => Err(io_error(source)),
        outcome => outcome,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        tokens: Vec<(String, &'static str, Option<String>)>,
    }

    impl TokenSink for Recorder {
        fn token(&mut self, path: &JsonPath, event: Event) -> Result<()> {
            let value = match &event {
                Event::MapKey(key) => Some(key.clone()),
                Event::Scalar(ScalarValue::Number(n)) => Some(n.to_string()),
                Event::Scalar(ScalarValue::Boolean(b)) => Some(b.to_string()),
                Event::Scalar(ScalarValue::String(s)) => Some(s.clone()),
                _ => None,
            };
            self.tokens.push((path.to_string(), event.name(), value));
            Ok(())
        }
    }

    fn record(json: &str) -> Vec<(String, &'static str, Option<String>)> {
        let mut recorder = Recorder::default();
        parse_reader(json.as_bytes(), &mut recorder).unwrap();
        recorder.tokens
    }

    fn tok(path: &str, name: &'static str, value: Option<&str>) -> (String, &'static str, Option<String>) {
        (path.to_string(), name, value.map(str::to_string))
    }

    #[test]
    fn test_item_prefixes_follow_array_elements() {
        let tokens = record(r#"{"started": 1, "connection_stats": [{"open": 7, "failed": false}]}"#);

        assert_eq!(
            tokens,
            vec![
                tok("", "start_map", None),
                tok("", "map_key", Some("started")),
                tok("started", "number", Some("1")),
                tok("", "map_key", Some("connection_stats")),
                tok("connection_stats", "start_array", None),
                tok("connection_stats.item", "start_map", None),
                tok("connection_stats.item", "map_key", Some("open")),
                tok("connection_stats.item.open", "number", Some("7")),
                tok("connection_stats.item", "map_key", Some("failed")),
                tok("connection_stats.item.failed", "boolean", Some("false")),
                tok("connection_stats.item", "end_map", None),
                tok("connection_stats", "end_array", None),
                tok("", "end_map", None),
            ]
        );
    }

    #[test]
    fn test_nested_arrays_and_scalars() {
        let tokens = record(r#"[[1.5, null], "x", -3]"#);

        assert_eq!(
            tokens,
            vec![
                tok("", "start_array", None),
                tok("item", "start_array", None),
                tok("item.item", "number", Some("1.5")),
                tok("item.item", "null", None),
                tok("item", "end_array", None),
                tok("item", "string", Some("x")),
                tok("item", "number", Some("-3")),
                tok("", "end_array", None),
            ]
        );
    }

    #[test]
    fn test_malformed_json_reports_position() {
        let mut recorder = Recorder::default();
        let err = parse_reader("{\n  \"started\": 1,\n  \"ended\": }".as_bytes(), &mut recorder)
            .unwrap_err();

        match err {
            AnalyzeError::Parse { line, .. } => assert_eq!(line, 3),
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_trailing_garbage_is_rejected() {
        let mut recorder = Recorder::default();
        let err = parse_reader(r#"{"a": 1} {"b": 2}"#.as_bytes(), &mut recorder).unwrap_err();
        assert!(matches!(err, AnalyzeError::Parse { .. }));
    }

    #[test]
    fn test_sink_error_is_returned_unchanged() {
        struct Stop;

        impl TokenSink for Stop {
            fn token(&mut self, _path: &JsonPath, event: Event) -> Result<()> {
                match event {
                    Event::MapKey(_) => Err(AnalyzeError::MalformedResult("stop".to_string())),
                    _ => Ok(()),
                }
            }
        }

        let err = parse_reader(r#"{"a": 1}"#.as_bytes(), Stop).unwrap_err();
        match err {
            AnalyzeError::MalformedResult(msg) => assert_eq!(msg, "stop"),
            other => panic!("unexpected error {:?}", other),
        }
    }

    /// Hands out `data` and then fails instead of reporting end of input
    struct FailingReader<'a> {
        data: &'a [u8],
    }

    impl Read for FailingReader<'_> {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.data.is_empty() {
                return Err(std::io::Error::new(std::io::ErrorKind::Other, "device went away"));
            }
            let n = buf.len().min(self.data.len());
            buf[..n].copy_from_slice(&self.data[..n]);
            self.data = &self.data[n..];
            Ok(n)
        }
    }

    #[test]
    fn test_read_failure_is_not_a_parse_error() {
        let reader = FailingReader {
            data: br#"{"started": 1, "connection_stats": ["#,
        };
        let mut recorder = Recorder::default();

        let err = parse_reader(reader, &mut recorder).unwrap_err();
        match err {
            AnalyzeError::Read(source) => assert_eq!(source.to_string(), "device went away"),
            other => panic!("expected read error, got {:?}", other),
        }
        assert_eq!(recorder.tokens[1], tok("", "map_key", Some("started")));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = parse_file(Path::new("/nonexistent/wsperf.json"), Recorder::default()).unwrap_err();
        assert!(matches!(err, AnalyzeError::Io { .. }));
    }
}
