//! `serde` support.
//!
//! - [`Vector`] serializes as a sequence and deserializes from any sequence.
//! - [`SmallString`] serializes as a string and deserializes from a string or
//!   UTF-8 bytes.
//!
//! Deserialization fails instead of panicking when the input exceeds the
//! maximum size of the metadata format.
use std::{
	fmt,
	marker::PhantomData
};
use serde::{
	de,
	ser::SerializeSeq,
	Deserialize,
	Deserializer,
	Serialize,
	Serializer
};
use crate::{
	raw::Meta,
	SmallString,
	Vector
};

impl<T: Serialize, const N: usize, M: Meta> Serialize for Vector<T, N, M> {
	fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
		let mut seq = s.serialize_seq(Some(self.len()))?;
		for item in self {
			seq.serialize_element(item)?;
		}
		seq.end()
	}
}

struct VectorVisitor<T, const N: usize, M>(PhantomData<(T, M)>);

impl<'de, T: Deserialize<'de>, const N: usize, M: Meta> de::Visitor<'de> for VectorVisitor<T, N, M> {
	type Value = Vector<T, N, M>;

	fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
		write!(f, "a sequence with at most {} elements", M::MAX_LENGTH)
	}

	fn visit_seq<A: de::SeqAccess<'de>>(self, mut a: A) -> Result<Self::Value, A::Error> {
		let mut out = Vector::new();
		if let Some(hint) = a.size_hint() {
			// The hint is not trusted beyond a page worth of elements.
			out.try_reserve(hint.min(4096)).map_err(de::Error::custom)?;
		}

		while let Some(elem) = a.next_element::<T>()? {
			out.try_push(elem).map_err(|(_, e)| de::Error::custom(e))?;
		}

		Ok(out)
	}
}

impl<'de, T: Deserialize<'de>, const N: usize, M: Meta> Deserialize<'de> for Vector<T, N, M> {
	fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
		d.deserialize_seq(VectorVisitor::<T, N, M>(PhantomData))
	}
}

impl<const N: usize, M: Meta> Serialize for SmallString<N, M> {
	fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
		s.serialize_str(self.as_str())
	}
}

struct StringVisitor<const N: usize, M>(PhantomData<M>);

impl<'de, const N: usize, M: Meta> de::Visitor<'de> for StringVisitor<N, M> {
	type Value = SmallString<N, M>;

	fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
		write!(f, "a string")
	}

	fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
		let mut out = SmallString::new();
		out.try_reserve(v.len()).map_err(E::custom)?;
		out.push_str(v);
		Ok(out)
	}

	fn visit_bytes<E: de::Error>(self, v: &[u8]) -> Result<Self::Value, E> {
		match std::str::from_utf8(v) {
			Ok(s) => self.visit_str(s),
			Err(_) => Err(E::invalid_value(de::Unexpected::Bytes(v), &self))
		}
	}
}

impl<'de, const N: usize, M: Meta> Deserialize<'de> for SmallString<N, M> {
	fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
		d.deserialize_str(StringVisitor::<N, M>(PhantomData))
	}
}

#[cfg(test)]
mod tests {
	use crate::{
		lean,
		SmallString,
		Vector
	};

	#[test]
	fn vector_roundtrip_json() {
		let v: Vector<i32, 2> = Vector::from([1, 2, 3]);
		let s = serde_json::to_string(&v).unwrap();
		assert_eq!(s, "[1,2,3]");
		let back: Vector<i32, 2> = serde_json::from_str(&s).unwrap();
		assert_eq!(back, v);
		assert!(back.is_spilled());
	}

	#[test]
	fn empty_vector_json() {
		let v: lean::Vector<String, 4> = Vector::new();
		assert_eq!(serde_json::to_string(&v).unwrap(), "[]");
		let back: lean::Vector<String, 4> = serde_json::from_str("[]").unwrap();
		assert!(back.is_empty());
	}

	#[test]
	fn string_roundtrip_json() {
		let s: SmallString = SmallString::from("héllo \"world\"");
		let json = serde_json::to_string(&s).unwrap();
		assert_eq!(json, r#""héllo \"world\"""#);
		let back: SmallString = serde_json::from_str(&json).unwrap();
		assert_eq!(back, s);
	}

	#[test]
	fn string_rejects_non_strings() {
		let err = serde_json::from_str::<SmallString>("[1]").unwrap_err();
		assert!(err.to_string().contains("a string"), "unexpected error message: {}", err);
	}
}
