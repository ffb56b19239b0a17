pub mod static_string;
pub mod text;

pub use static_string::StaticString;
pub use text::{DefaultText, Text, Text32, Text64, Text128, Text256, Text512, Text1024, Text2048, Text4096};

/// A trait for abstraction over byte-string types (heap, inline, fixed).
pub trait AnyText {
    fn as_bytes(&self) -> &[u8];
    fn len(&self) -> usize {
        self.as_bytes().len()
    }
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
    fn append_bytes(&mut self, bytes: &[u8]);
    fn clear(&mut self);
    fn truncate(&mut self, len: usize);
}

impl AnyText for Vec<u8> {
    fn as_bytes(&self) -> &[u8] {
        self.as_slice()
    }
    fn append_bytes(&mut self, bytes: &[u8]) {
        self.extend_from_slice(bytes);
    }
    fn clear(&mut self) {
        self.clear();
    }
    fn truncate(&mut self, len: usize) {
        self.truncate(len);
    }
}
