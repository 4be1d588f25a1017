//! PDF object types.
//!
//! [`Object`] is the closed set of PDF value kinds. Every value produced by
//! the lexer is wrapped in a [`ParsedObject`] that records the half-open byte
//! range it was parsed from.

use bytes::Bytes;
use indexmap::IndexMap;
use std::ops::Range;
use std::sync::OnceLock;

use crate::decoders::{self, DecodeParams};
use crate::error::{FilterError, FilterResult, Result};
use crate::parser_config::ParserOptions;

/// PDF object representation.
#[derive(Debug, Clone, PartialEq)]
pub enum Object {
    /// Null object
    Null,
    /// Boolean value
    Boolean(bool),
    /// Integer value
    Integer(i64),
    /// Real (floating-point) value
    Real(f64),
    /// Literal or hex string (byte array)
    String(Vec<u8>),
    /// Name (starting with /), escapes already decoded
    Name(String),
    /// Array of objects
    Array(Vec<ParsedObject>),
    /// Dictionary (key-value pairs)
    Dictionary(Dictionary),
    /// Indirect object reference
    Reference(ObjectRef),
    /// Stream (dictionary + raw payload)
    Stream(Stream),
}

/// Reference to an indirect object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize)]
pub struct ObjectRef {
    /// Object number
    pub object_num: u32,
    /// Generation number
    pub generation_num: u32,
}

impl ObjectRef {
    /// Create a new object reference.
    pub fn new(object_num: u32, generation_num: u32) -> Self {
        Self {
            object_num,
            generation_num,
        }
    }
}

impl std::fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} R", self.object_num, self.generation_num)
    }
}

impl Object {
    /// Get the type name of this object (without data).
    pub fn type_name(&self) -> &'static str {
        match self {
            Object::Null => "Null",
            Object::Boolean(_) => "Boolean",
            Object::Integer(_) => "Integer",
            Object::Real(_) => "Real",
            Object::String(_) => "String",
            Object::Name(_) => "Name",
            Object::Array(_) => "Array",
            Object::Dictionary(_) => "Dictionary",
            Object::Reference(_) => "Reference",
            Object::Stream(_) => "Stream",
        }
    }

    /// Try to cast to integer.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Object::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Try to cast to real number. Integers widen.
    pub fn as_real(&self) -> Option<f64> {
        match self {
            Object::Real(r) => Some(*r),
            Object::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Try to cast to boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Object::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Try to cast to name.
    pub fn as_name(&self) -> Option<&str> {
        match self {
            Object::Name(s) => Some(s),
            _ => None,
        }
    }

    /// Try to cast to string (bytes).
    pub fn as_string(&self) -> Option<&[u8]> {
        match self {
            Object::String(s) => Some(s),
            _ => None,
        }
    }

    /// Try to cast to array.
    pub fn as_array(&self) -> Option<&[ParsedObject]> {
        match self {
            Object::Array(arr) => Some(arr),
            _ => None,
        }
    }

    /// Try to cast to dictionary.
    pub fn as_dict(&self) -> Option<&Dictionary> {
        match self {
            Object::Dictionary(d) => Some(d),
            _ => None,
        }
    }

    /// Try to cast to reference.
    pub fn as_reference(&self) -> Option<ObjectRef> {
        match self {
            Object::Reference(r) => Some(*r),
            _ => None,
        }
    }

    /// Try to cast to stream.
    pub fn as_stream(&self) -> Option<&Stream> {
        match self {
            Object::Stream(s) => Some(s),
            _ => None,
        }
    }

    /// Check if object is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Object::Null)
    }
}

/// An object together with the byte range it was parsed from.
///
/// Objects from [`ObjectLexer`](crate::parser::ObjectLexer) always have
/// `end_pos > start_pos`. Objects built in code have the empty span `0..0`.
///
/// Equality ignores the range, so two parses of the same value at different
/// offsets compare equal.
#[derive(Debug, Clone)]
pub struct ParsedObject {
    pub value: Object,
    pub start_pos: usize,
    pub end_pos: usize,
}

impl ParsedObject {
    pub fn new(value: Object, start_pos: usize, end_pos: usize) -> Self {
        Self {
            value,
            start_pos,
            end_pos,
        }
    }

    /// Half-open byte range covered by this object.
    pub fn span(&self) -> Range<usize> {
        self.start_pos..self.end_pos
    }
}

impl PartialEq for ParsedObject {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

/// Wraps a value built in code. It has no source bytes, so the span is
/// the empty `0..0`.
impl From<Object> for ParsedObject {
    fn from(value: Object) -> Self {
        Self::new(value, 0, 0)
    }
}

/// PDF dictionary.
///
/// Entries are kept in the order they were written, duplicates included.
/// Lookup by key returns the value written last.
#[derive(Debug, Clone, Default)]
pub struct Dictionary {
    entries: Vec<(String, ParsedObject)>,
    index: IndexMap<String, usize>,
}

impl Dictionary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry. A repeated key shadows the earlier value but keeps
    /// its first-seen position in [`keys`](Self::keys).
    pub fn insert(&mut self, key: impl Into<String>, value: ParsedObject) {
        let key = key.into();
        self.index.insert(key.clone(), self.entries.len());
        self.entries.push((key, value));
    }

    pub fn get(&self, key: &str) -> Option<&ParsedObject> {
        self.index.get(key).map(|&i| &self.entries[i].1)
    }

    /// Value of `key` without its span.
    pub fn get_object(&self, key: &str) -> Option<&Object> {
        self.get(key).map(|obj| &obj.value)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Distinct keys in first-seen order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.index.keys().map(String::as_str)
    }

    /// Distinct keys with their effective values, in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParsedObject)> {
        self.index
            .iter()
            .map(|(key, &i)| (key.as_str(), &self.entries[i].1))
    }

    /// Every entry as written, including shadowed duplicates.
    pub fn entries(&self) -> &[(String, ParsedObject)] {
        &self.entries
    }

    pub fn get_integer(&self, key: &str) -> Option<i64> {
        self.get_object(key).and_then(Object::as_integer)
    }

    pub fn get_name(&self, key: &str) -> Option<&str> {
        self.get_object(key).and_then(Object::as_name)
    }

    pub fn get_reference(&self, key: &str) -> Option<ObjectRef> {
        self.get_object(key).and_then(Object::as_reference)
    }

    pub fn get_array(&self, key: &str) -> Option<&[ParsedObject]> {
        self.get_object(key).and_then(Object::as_array)
    }

    pub fn get_dict(&self, key: &str) -> Option<&Dictionary> {
        self.get_object(key).and_then(Object::as_dict)
    }
}

/// Two dictionaries are equal when they map the same keys to equal values.
impl PartialEq for Dictionary {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|(key, value)| other.get(key) == Some(value))
    }
}

impl<K: Into<String>> FromIterator<(K, ParsedObject)> for Dictionary {
    fn from_iter<I: IntoIterator<Item = (K, ParsedObject)>>(iter: I) -> Self {
        let mut dict = Dictionary::new();
        for (key, value) in iter {
            dict.insert(key, value);
        }
        dict
    }
}

/// PDF stream: a dictionary plus its still-encoded payload.
///
/// The payload is a zero-copy slice of the document bytes. Decoded content
/// is computed on first request and cached.
#[derive(Debug, Clone)]
pub struct Stream {
    dict: Dictionary,
    raw: Bytes,
    decoded: OnceLock<Vec<u8>>,
}

impl Stream {
    pub fn new(dict: Dictionary, raw: impl Into<Bytes>) -> Self {
        Self {
            dict,
            raw: raw.into(),
            decoded: OnceLock::new(),
        }
    }

    pub fn dict(&self) -> &Dictionary {
        &self.dict
    }

    /// Encoded payload exactly as stored in the file.
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    /// Filters from `/Filter`, each paired positionally with its `/DecodeParms`.
    pub fn filters(&self) -> FilterResult<Vec<(String, DecodeParams)>> {
        let names = match self.dict.get_object("Filter") {
            None | Some(Object::Null) => return Ok(Vec::new()),
            Some(filter) => extract_filter_names(filter)?,
        };
        let params = extract_decode_params(self.dict.get_object("DecodeParms"), names.len())?;
        Ok(names.into_iter().zip(params).collect())
    }

    /// Decode with default limits.
    pub fn decode(&self) -> Result<&[u8]> {
        self.decode_with_options(&ParserOptions::default())
    }

    /// Run the filter pipeline once and cache the result.
    ///
    /// Later calls return the cached bytes. A failed decode is not cached.
    pub fn decode_with_options(&self, options: &ParserOptions) -> Result<&[u8]> {
        if let Some(data) = self.decoded.get() {
            return Ok(data);
        }
        let chain = self.filters()?;
        let data = decoders::decode_pipeline(&self.raw, &chain, options)?;
        log::debug!(
            "Decoded stream through {} filter(s): {} -> {} bytes",
            chain.len(),
            self.raw.len(),
            data.len()
        );
        Ok(self.decoded.get_or_init(|| data).as_slice())
    }

    /// Whether a decoded payload is cached.
    pub fn is_decoded(&self) -> bool {
        self.decoded.get().is_some()
    }
}

impl PartialEq for Stream {
    fn eq(&self, other: &Self) -> bool {
        self.dict == other.dict && self.raw == other.raw
    }
}

/// Extract filter names from a Filter object.
///
/// The Filter entry can be a single Name or an Array of Names.
fn extract_filter_names(filter_obj: &Object) -> FilterResult<Vec<String>> {
    match filter_obj {
        Object::Name(name) => Ok(vec![name.clone()]),
        Object::Array(arr) => arr
            .iter()
            .map(|obj| {
                obj.value.as_name().map(str::to_string).ok_or_else(|| {
                    FilterError::InvalidFilterParameter(format!(
                        "/Filter array entry is {}, expected Name",
                        obj.value.type_name()
                    ))
                })
            })
            .collect(),
        other => Err(FilterError::InvalidFilterParameter(format!(
            "/Filter is {}, expected Name or Array",
            other.type_name()
        ))),
    }
}

/// Extract one `DecodeParams` per filter from a DecodeParms object.
///
/// A single dictionary applies to the first filter; an array is matched
/// positionally. Missing or null entries get default parameters.
fn extract_decode_params(params_obj: Option<&Object>, count: usize) -> FilterResult<Vec<DecodeParams>> {
    let mut params = vec![DecodeParams::default(); count];
    match params_obj {
        None | Some(Object::Null) => {},
        Some(Object::Dictionary(dict)) => {
            if let Some(first) = params.first_mut() {
                *first = DecodeParams::from_dictionary(dict)?;
            }
        },
        Some(Object::Array(arr)) => {
            for (slot, entry) in params.iter_mut().zip(arr) {
                match &entry.value {
                    Object::Null => {},
                    Object::Dictionary(dict) => *slot = DecodeParams::from_dictionary(dict)?,
                    other => {
                        return Err(FilterError::InvalidFilterParameter(format!(
                            "/DecodeParms array entry is {}, expected Dictionary",
                            other.type_name()
                        )))
                    },
                }
            }
        },
        Some(other) => {
            return Err(FilterError::InvalidFilterParameter(format!(
                "/DecodeParms is {}, expected Dictionary or Array",
                other.type_name()
            )))
        },
    }
    Ok(params)
}

/// An object read from an `N G obj ... endobj` envelope.
#[derive(Debug, Clone, PartialEq)]
pub struct IndirectObject {
    pub object_num: u32,
    pub generation_num: u32,
    pub value: ParsedObject,
    /// Offset of the object number
    pub start_pos: usize,
    /// Offset just past `endobj`
    pub end_pos: usize,
}

impl IndirectObject {
    pub fn reference(&self) -> ObjectRef {
        ObjectRef::new(self.object_num, self.generation_num)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(s: &str) -> ParsedObject {
        Object::Name(s.to_string()).into()
    }

    fn int(i: i64) -> ParsedObject {
        Object::Integer(i).into()
    }

    #[test]
    fn test_object_accessors() {
        assert_eq!(Object::Integer(42).as_integer(), Some(42));
        assert_eq!(Object::Integer(42).as_real(), Some(42.0));
        assert_eq!(Object::Real(2.5).as_integer(), None);
        assert_eq!(Object::Boolean(true).as_bool(), Some(true));
        assert_eq!(Object::Name("Type".into()).as_name(), Some("Type"));
        assert_eq!(Object::String(b"Hi".to_vec()).as_string(), Some(&b"Hi"[..]));
        assert!(Object::Null.is_null());
        assert_eq!(Object::Reference(ObjectRef::new(5, 1)).as_reference(), Some(ObjectRef::new(5, 1)));
    }

    #[test]
    fn test_type_names() {
        assert_eq!(Object::Null.type_name(), "Null");
        assert_eq!(Object::Array(vec![]).type_name(), "Array");
        assert_eq!(Object::Stream(Stream::new(Dictionary::new(), Vec::new())).type_name(), "Stream");
    }

    #[test]
    fn test_object_ref_display() {
        assert_eq!(ObjectRef::new(10, 0).to_string(), "10 0 R");
    }

    #[test]
    fn test_parsed_object_equality_ignores_span() {
        let a = ParsedObject::new(Object::Integer(1), 0, 1);
        let b = ParsedObject::new(Object::Integer(1), 10, 11);
        assert_eq!(a, b);
        assert_eq!(b.span(), 10..11);
    }

    #[test]
    fn test_built_object_has_empty_span() {
        let built = ParsedObject::from(Object::Integer(1));
        assert!(built.span().is_empty());
        assert_eq!((built.start_pos, built.end_pos), (0, 0));
    }

    #[test]
    fn test_dictionary_last_write_wins() {
        let mut dict = Dictionary::new();
        dict.insert("A", int(1));
        dict.insert("B", int(2));
        dict.insert("A", int(3));

        assert_eq!(dict.len(), 2);
        assert_eq!(dict.get_integer("A"), Some(3));
        assert_eq!(dict.keys().collect::<Vec<_>>(), vec!["A", "B"]);
        assert_eq!(dict.entries().len(), 3);
        assert_eq!(dict.entries()[0].1, int(1));
    }

    #[test]
    fn test_dictionary_equality_ignores_order() {
        let a: Dictionary = vec![("X", int(1)), ("Y", int(2))].into_iter().collect();
        let b: Dictionary = vec![("Y", int(2)), ("X", int(1))].into_iter().collect();
        let c: Dictionary = vec![("X", int(1))].into_iter().collect();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_dictionary_typed_getters() {
        let dict: Dictionary = vec![
            ("Type", name("XRef")),
            ("Root", Object::Reference(ObjectRef::new(1, 0)).into()),
            ("W", Object::Array(vec![int(1), int(2), int(1)]).into()),
        ]
        .into_iter()
        .collect();

        assert_eq!(dict.get_name("Type"), Some("XRef"));
        assert_eq!(dict.get_reference("Root"), Some(ObjectRef::new(1, 0)));
        assert_eq!(dict.get_array("W").map(|w| w.len()), Some(3));
        assert_eq!(dict.get_integer("Type"), None);
        assert!(dict.get_dict("W").is_none());
    }

    #[test]
    fn test_stream_filters_single_name() {
        let dict: Dictionary = vec![("Filter", name("FlateDecode"))].into_iter().collect();
        let stream = Stream::new(dict, Vec::new());
        let filters = stream.filters().unwrap();
        assert_eq!(filters.len(), 1);
        assert_eq!(filters[0].0, "FlateDecode");
        assert_eq!(filters[0].1, DecodeParams::default());
    }

    #[test]
    fn test_stream_filters_positional_params() {
        let params: Dictionary = vec![("Predictor", int(12)), ("Columns", int(4))].into_iter().collect();
        let dict: Dictionary = vec![
            ("Filter", Object::Array(vec![name("ASCIIHexDecode"), name("FlateDecode")]).into()),
            (
                "DecodeParms",
                Object::Array(vec![Object::Null.into(), Object::Dictionary(params).into()]).into(),
            ),
        ]
        .into_iter()
        .collect();
        let filters = Stream::new(dict, Vec::new()).filters().unwrap();
        assert_eq!(filters[0].1.predictor, 1);
        assert_eq!(filters[1].1.predictor, 12);
        assert_eq!(filters[1].1.columns, 4);
    }

    #[test]
    fn test_stream_filters_invalid() {
        let dict: Dictionary = vec![("Filter", int(3))].into_iter().collect();
        assert!(matches!(
            Stream::new(dict, Vec::new()).filters(),
            Err(FilterError::InvalidFilterParameter(_))
        ));
    }

    #[test]
    fn test_stream_without_filter_decodes_to_raw() {
        let stream = Stream::new(Dictionary::new(), b"plain".to_vec());
        assert_eq!(stream.decode().unwrap(), b"plain");
    }

    #[test]
    fn test_stream_decode_is_cached() {
        let dict: Dictionary = vec![("Filter", name("ASCIIHexDecode"))].into_iter().collect();
        let stream = Stream::new(dict, b"48656C6C6F>".to_vec());
        assert!(!stream.is_decoded());

        let first = stream.decode().unwrap();
        assert_eq!(first, b"Hello");
        assert!(stream.is_decoded());

        // Second call hands back the cached buffer instead of decoding "Hello" again
        let second = stream.decode().unwrap();
        assert_eq!(first.as_ptr(), second.as_ptr());
        assert_eq!(second, b"Hello");
    }

    #[test]
    fn test_stream_decode_failure_not_cached() {
        let dict: Dictionary = vec![("Filter", name("DCTDecode"))].into_iter().collect();
        let stream = Stream::new(dict, b"data".to_vec());
        assert!(stream.decode().is_err());
        assert!(!stream.is_decoded());
    }

    #[test]
    fn test_indirect_object_reference() {
        let obj = IndirectObject {
            object_num: 4,
            generation_num: 2,
            value: Object::Null.into(),
            start_pos: 0,
            end_pos: 20,
        };
        assert_eq!(obj.reference(), ObjectRef::new(4, 2));
    }
}
