use crate::error::AnyError;
use prost::Message;
use prost_types::{DescriptorProto, FileDescriptorSet};
use std::collections::HashSet;

/// The set of message full names known to the compiled descriptor set the
/// host loaded at startup. Used to validate inbound type URLs before a decode
/// is attempted.
#[derive(Debug, Clone, Default)]
pub struct DescriptorPool {
    known_type_urls: HashSet<String>,
}

impl DescriptorPool {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_descriptor_set_bytes(bytes: &[u8]) -> Result<Self, AnyError> {
        let set = FileDescriptorSet::decode(bytes)
            .map_err(|e| AnyError::SerializationError(e.to_string()))?;
        let mut known_type_urls = HashSet::new();
        for file in &set.file {
            let package = file.package().to_string();
            for message in &file.message_type {
                collect_message_names(&package, message, &mut known_type_urls);
            }
        }
        Ok(Self { known_type_urls })
    }

    pub fn contains(&self, type_url: &str) -> bool {
        self.known_type_urls.contains(type_url)
    }

    pub fn len(&self) -> usize {
        self.known_type_urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.known_type_urls.is_empty()
    }
}

fn collect_message_names(
    package: &str,
    message: &DescriptorProto,
    into: &mut HashSet<String>,
) {
    let full_name = if package.is_empty() {
        message.name().to_string()
    } else {
        format!("{package}.{}", message.name())
    };
    into.insert(format!("type.googleapis.com/{full_name}"));
    for nested in &message.nested_type {
        collect_message_names(&full_name, nested, into);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_pool_knows_nothing() {
        let pool = DescriptorPool::empty();
        assert!(!pool.contains("type.googleapis.com/com.example.Foo"));
    }
}
