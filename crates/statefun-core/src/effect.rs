//! Service/command references and the effect serializer that validates them
//! against a registered service before they're embedded in a reply.

use crate::error::RuntimeError;
use crate::metadata::Metadata;
use statefun_any::AnyValue;

/// A fully-qualified reference to one method of a registered service,
/// produced after [`EffectSerializer::serialize`] validates it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServiceCommandRef {
    pub service_name: String,
    pub command_name: String,
}

/// A serialized effect call, ready to embed in a forward or a side-effect
/// list: the validated method reference plus its Any-encoded payload.
#[derive(Clone, Debug, PartialEq)]
pub struct EffectPayload {
    pub command: ServiceCommandRef,
    pub payload: AnyValue,
}

/// A fire-and-forget (or synchronous) call to another service, issued as a
/// side effect of the current command.
#[derive(Clone, Debug, PartialEq)]
pub struct Effect {
    pub call: EffectPayload,
    pub synchronous: bool,
    pub metadata: Metadata,
}

/// Validates that a method reference belongs to a service registered with
/// the owning component, and packages the payload for the wire.
pub struct EffectSerializer<'a> {
    known_services: &'a [String],
}

impl<'a> EffectSerializer<'a> {
    pub fn new(known_services: &'a [String]) -> Self {
        Self { known_services }
    }

    pub fn serialize(
        &self,
        service_name: &str,
        command_name: &str,
        payload: AnyValue,
        known_commands: &[&str],
    ) -> Result<EffectPayload, RuntimeError> {
        if !self.known_services.iter().any(|s| s == service_name) {
            return Err(RuntimeError::UnknownService(service_name.to_string()));
        }
        if !known_commands.contains(&command_name) {
            return Err(RuntimeError::MethodNotInService {
                service: service_name.to_string(),
                method: command_name.to_string(),
            });
        }
        Ok(EffectPayload {
            command: ServiceCommandRef {
                service_name: service_name.to_string(),
                command_name: command_name.to_string(),
            },
            payload,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unregistered_service_is_rejected() {
        let known = vec!["com.example.ExampleService".to_string()];
        let serializer = EffectSerializer::new(&known);
        let result = serializer.serialize(
            "com.example.ExampleServiceTwo",
            "DoThing",
            AnyValue::encode_bool(true),
            &["DoThing"],
        );
        assert!(matches!(result, Err(RuntimeError::UnknownService(_))));
    }

    #[test]
    fn unregistered_method_is_rejected() {
        let known = vec!["com.example.ExampleService".to_string()];
        let serializer = EffectSerializer::new(&known);
        let result = serializer.serialize(
            "com.example.ExampleService",
            "Missing",
            AnyValue::encode_bool(true),
            &["DoThing"],
        );
        assert!(matches!(
            result,
            Err(RuntimeError::MethodNotInService { .. })
        ));
    }

    #[test]
    fn valid_method_yields_correct_type_url() {
        let known = vec!["com.example.ExampleService".to_string()];
        let serializer = EffectSerializer::new(&known);
        let result = serializer
            .serialize(
                "com.example.ExampleService",
                "DoThing",
                AnyValue::encode_string("payload"),
                &["DoThing"],
            )
            .unwrap();
        assert_eq!(
            result.payload.type_url,
            "type.googleapis.com/google.protobuf.StringValue"
        );
    }
}
