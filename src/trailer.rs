//! Typed view of a trailer dictionary.
//!
//! Classic tables carry their trailer after the `trailer` keyword; a
//! cross-reference stream's own dictionary doubles as its trailer. Both end
//! up here.

use crate::error::{XRefError, XRefErrorKind};
use crate::object::{Dictionary, Object, ObjectRef, ParsedObject};

/// Trailer of one cross-reference section.
///
/// Every field is optional except `size`; an absent entry is `None`, which
/// is distinct from an entry present with value zero.
#[derive(Debug, Clone, PartialEq)]
pub struct Trailer {
    /// `/Size`: one greater than the highest object number
    pub size: u32,
    /// `/Prev`: offset of the previous section
    pub prev: Option<u64>,
    /// `/Root`: document catalog
    pub root: Option<ObjectRef>,
    /// `/Encrypt`: kept as-is, decryption happens elsewhere
    pub encrypt: Option<ParsedObject>,
    /// `/Info`: document information dictionary
    pub info: Option<ObjectRef>,
    /// `/ID`: the two file identifiers
    pub id: Option<[Vec<u8>; 2]>,
    /// `/Index` of a cross-reference stream, as flat `first count` pairs
    pub index: Option<Vec<u32>>,
    /// `/W` of a cross-reference stream
    pub widths: Option<[u8; 3]>,
    /// `/XRefStm` of a hybrid file
    pub xref_stream: Option<u64>,
    /// The dictionary this trailer was read from
    pub dictionary: Dictionary,
}

fn invalid(key: &str, found: &Object, offset: u64) -> XRefError {
    log::debug!("Trailer /{} has unexpected value ({})", key, found.type_name());
    XRefError::new(XRefErrorKind::InvalidTrailer, offset)
}

/// Non-negative integer entry that must fit `T`.
fn unsigned<T: TryFrom<i64>>(dict: &Dictionary, key: &str, offset: u64) -> Result<Option<T>, XRefError> {
    match dict.get_object(key) {
        None => Ok(None),
        Some(obj @ Object::Integer(value)) => T::try_from(*value)
            .map(Some)
            .map_err(|_| invalid(key, obj, offset)),
        Some(obj) => Err(invalid(key, obj, offset)),
    }
}

fn reference(dict: &Dictionary, key: &str, offset: u64) -> Result<Option<ObjectRef>, XRefError> {
    match dict.get_object(key) {
        None => Ok(None),
        Some(Object::Reference(r)) => Ok(Some(*r)),
        Some(obj) => Err(invalid(key, obj, offset)),
    }
}

fn unsigned_array<T: TryFrom<i64>>(dict: &Dictionary, key: &str, offset: u64) -> Result<Option<Vec<T>>, XRefError> {
    let Some(obj) = dict.get_object(key) else {
        return Ok(None);
    };
    let items = obj.as_array().ok_or_else(|| invalid(key, obj, offset))?;
    items
        .iter()
        .map(|item| {
            item.value
                .as_integer()
                .and_then(|v| T::try_from(v).ok())
                .ok_or_else(|| invalid(key, &item.value, offset))
        })
        .collect::<Result<Vec<T>, XRefError>>()
        .map(Some)
}

fn file_id(dict: &Dictionary) -> Option<[Vec<u8>; 2]> {
    let obj = dict.get_object("ID")?;
    match obj.as_array() {
        Some([first, second]) => match (first.value.as_string(), second.value.as_string()) {
            (Some(a), Some(b)) => Some([a.to_vec(), b.to_vec()]),
            _ => {
                log::warn!("Ignoring /ID whose elements are not strings");
                None
            },
        },
        _ => {
            log::warn!("Ignoring malformed /ID ({})", obj.type_name());
            None
        },
    }
}

impl Trailer {
    /// Project `dict` onto the typed trailer fields.
    ///
    /// `offset` is the section offset, used for error reporting. A missing
    /// or mistyped `/Size`, or a mistyped `/Prev`, `/Root`, `/Info`,
    /// `/XRefStm`, `/W` or `/Index`, is an `InvalidTrailer` error. A
    /// malformed `/ID` is dropped with a warning.
    pub fn from_dictionary(dict: &Dictionary, offset: u64) -> Result<Self, XRefError> {
        let size = unsigned::<u32>(dict, "Size", offset)?.ok_or_else(|| {
            log::debug!("Trailer at {} has no /Size", offset);
            XRefError::new(XRefErrorKind::InvalidTrailer, offset)
        })?;

        let widths = match unsigned_array::<u8>(dict, "W", offset)? {
            None => None,
            Some(w) => match <[u8; 3]>::try_from(w) {
                Ok(w) => Some(w),
                Err(w) => {
                    log::debug!("/W has {} elements, expected 3", w.len());
                    return Err(XRefError::new(XRefErrorKind::InvalidTrailer, offset));
                },
            },
        };

        let index = unsigned_array::<u32>(dict, "Index", offset)?;
        if let Some(pairs) = &index {
            if pairs.len() % 2 != 0 {
                log::debug!("/Index has odd length {}", pairs.len());
                return Err(XRefError::new(XRefErrorKind::InvalidTrailer, offset));
            }
        }

        Ok(Self {
            size,
            prev: unsigned(dict, "Prev", offset)?,
            root: reference(dict, "Root", offset)?,
            encrypt: dict.get("Encrypt").cloned(),
            info: reference(dict, "Info", offset)?,
            id: file_id(dict),
            index,
            widths,
            xref_stream: unsigned(dict, "XRefStm", offset)?,
            dictionary: dict.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::ObjectLexer;
    use crate::source::ByteSource;

    fn trailer(text: &'static str) -> Result<Trailer, XRefError> {
        let source = ByteSource::from(text.as_bytes());
        let parsed = ObjectLexer::new(&source).parse_object(0).unwrap().unwrap();
        Trailer::from_dictionary(parsed.value.as_dict().unwrap(), 0)
    }

    #[test]
    fn test_full_trailer() {
        let t = trailer(
            "<< /Size 22 /Prev 4096 /Root 1 0 R /Info 2 0 R /Encrypt 9 0 R \
             /ID [<0102> (ab)] /XRefStm 1500 >>",
        )
        .unwrap();
        assert_eq!(t.size, 22);
        assert_eq!(t.prev, Some(4096));
        assert_eq!(t.root, Some(ObjectRef::new(1, 0)));
        assert_eq!(t.info, Some(ObjectRef::new(2, 0)));
        assert_eq!(t.encrypt.unwrap().value, Object::Reference(ObjectRef::new(9, 0)));
        assert_eq!(t.id, Some([vec![1, 2], b"ab".to_vec()]));
        assert_eq!(t.xref_stream, Some(1500));
        assert!(t.index.is_none());
        assert!(t.widths.is_none());
    }

    #[test]
    fn test_absent_is_not_zero() {
        let t = trailer("<< /Size 1 /Prev 0 >>").unwrap();
        assert_eq!(t.prev, Some(0));
        assert_eq!(t.root, None);
        assert_eq!(t.xref_stream, None);
    }

    #[test]
    fn test_stream_fields() {
        let t = trailer("<< /Size 100 /Index [2 10 50 3] /W [1 2 1] >>").unwrap();
        assert_eq!(t.index, Some(vec![2, 10, 50, 3]));
        assert_eq!(t.widths, Some([1, 2, 1]));
    }

    #[test]
    fn test_missing_size() {
        let err = trailer("<< /Root 1 0 R >>").unwrap_err();
        assert_eq!(err.kind, XRefErrorKind::InvalidTrailer);
    }

    #[test]
    fn test_mistyped_entries() {
        for text in [
            "<< /Size -1 >>",
            "<< /Size 3 /Prev (x) >>",
            "<< /Size 3 /Root 1 >>",
            "<< /Size 3 /Info /Name >>",
            "<< /Size 3 /W [1 2] >>",
            "<< /Size 3 /W [1 300 1] >>",
            "<< /Size 3 /Index [0] >>",
            "<< /Size 3 /XRefStm 1.5 >>",
        ] {
            assert!(trailer(text).is_err(), "{} should be rejected", text);
        }
    }

    #[test]
    fn test_malformed_id_is_ignored() {
        let t = trailer("<< /Size 3 /ID [<01>] >>").unwrap();
        assert!(t.id.is_none());
        let t = trailer("<< /Size 3 /ID (abc) >>").unwrap();
        assert!(t.id.is_none());
    }
}
