//! Conversions between wire (prost-generated) messages and the runtime's
//! in-process types. Kept one-directional where the wire format is strictly
//! richer or poorer than the in-process type (e.g. `NoReply` has no payload).

use crate::proto;
use statefun_any::AnyValue;
use statefun_core::{
    discovery, ComponentDescription, ComponentKind, Effect, EffectPayload, Metadata,
    MetadataValue, Reply, ReplyOutcome, ServiceCommandRef, WriteConsistency,
};

pub fn any_to_wire(v: &AnyValue) -> proto::AnyValue {
    proto::AnyValue {
        type_url: v.type_url.clone(),
        value: v.value.to_vec(),
    }
}

pub fn any_from_wire(v: &proto::AnyValue) -> AnyValue {
    AnyValue::new(v.type_url.clone(), v.value.clone())
}

pub fn crdt_delta_to_wire(payload: Vec<u8>) -> proto::CrdtDelta {
    proto::CrdtDelta { payload }
}

pub fn metadata_to_wire(m: &Metadata) -> proto::Metadata {
    let mut entries = Vec::new();
    for (key, value) in m.iter() {
        let wire_value = match value {
            MetadataValue::Text(t) => proto::metadata_entry::Value::Text(t.clone()),
            MetadataValue::Bytes(b) => proto::metadata_entry::Value::Binary(b.clone()),
        };
        entries.push(proto::MetadataEntry {
            key: key.to_string(),
            value: Some(wire_value),
        });
    }
    proto::Metadata { entries }
}

pub fn metadata_from_wire(m: &proto::Metadata) -> Metadata {
    let mut metadata = Metadata::new();
    for entry in &m.entries {
        let value = match &entry.value {
            Some(proto::metadata_entry::Value::Text(t)) => MetadataValue::Text(t.clone()),
            Some(proto::metadata_entry::Value::Binary(b)) => MetadataValue::Bytes(b.clone()),
            None => continue,
        };
        metadata.insert(&entry.key, value);
    }
    metadata
}

pub fn side_effect_to_wire(effect: &Effect) -> proto::SideEffect {
    proto::SideEffect {
        service_name: effect.call.command.service_name.clone(),
        command_name: effect.call.command.command_name.clone(),
        payload: Some(any_to_wire(&effect.call.payload)),
        synchronous: effect.synchronous,
        metadata: Some(metadata_to_wire(&effect.metadata)),
    }
}

fn effect_payload_to_wire(call: &EffectPayload) -> proto::SideEffect {
    proto::SideEffect {
        service_name: call.command.service_name.clone(),
        command_name: call.command.command_name.clone(),
        payload: Some(any_to_wire(&call.payload)),
        synchronous: false,
        metadata: None,
    }
}

fn effect_payload_from_wire(side_effect: &proto::SideEffect) -> EffectPayload {
    EffectPayload {
        command: ServiceCommandRef {
            service_name: side_effect.service_name.clone(),
            command_name: side_effect.command_name.clone(),
        },
        payload: side_effect
            .payload
            .as_ref()
            .map(any_from_wire)
            .unwrap_or_else(|| AnyValue::new("", Vec::new())),
    }
}

pub fn reply_to_wire(reply: &Reply) -> proto::Reply {
    let outcome = match reply.outcome() {
        ReplyOutcome::Message(v) => Some(proto::reply::Outcome::Message(any_to_wire(v))),
        ReplyOutcome::Forward(call, metadata) => {
            let mut side_effect = effect_payload_to_wire(call);
            side_effect.metadata = Some(metadata_to_wire(metadata));
            Some(proto::reply::Outcome::Forward(side_effect))
        }
        ReplyOutcome::Failure { message, grpc_status } => {
            Some(proto::reply::Outcome::Failure(proto::Failure {
                description: message.clone(),
                grpc_status_code: grpc_status.unwrap_or(0),
            }))
        }
        ReplyOutcome::NoReply => Some(proto::reply::Outcome::NoReply(true)),
    };
    proto::Reply {
        outcome,
        side_effects: reply.effects().iter().map(side_effect_to_wire).collect(),
    }
}

pub fn reply_from_wire(reply: &proto::Reply) -> Reply {
    let base = match &reply.outcome {
        Some(proto::reply::Outcome::Message(v)) => Reply::message(any_from_wire(v)),
        Some(proto::reply::Outcome::Forward(side_effect)) => Reply::forward(
            effect_payload_from_wire(side_effect),
            side_effect
                .metadata
                .as_ref()
                .map(metadata_from_wire)
                .unwrap_or_default(),
        ),
        Some(proto::reply::Outcome::Failure(f)) => Reply::failure(
            f.description.clone(),
            (f.grpc_status_code != 0).then_some(f.grpc_status_code),
        ),
        Some(proto::reply::Outcome::NoReply(_)) | None => Reply::no_reply(),
    };
    let effects = reply
        .side_effects
        .iter()
        .map(|side_effect| Effect {
            call: effect_payload_from_wire(side_effect),
            synchronous: side_effect.synchronous,
            metadata: side_effect
                .metadata
                .as_ref()
                .map(metadata_from_wire)
                .unwrap_or_default(),
        })
        .collect::<Vec<_>>();
    base.add_effects(effects)
}

fn write_consistency_to_wire(w: WriteConsistency) -> &'static str {
    match w {
        WriteConsistency::Local => "local",
        WriteConsistency::Majority => "majority",
        WriteConsistency::All => "all",
    }
}

fn component_kind_tag(kind: ComponentKind) -> &'static str {
    match kind {
        ComponentKind::Action => "action",
        ComponentKind::ValueEntity => "value-entity",
        ComponentKind::EventSourcedEntity => "event-sourced-entity",
        ComponentKind::ReplicatedEntity => "replicated-entity",
        ComponentKind::View => "view",
    }
}

fn component_fields_to_wire(
    service_name: &str,
    component_type: ComponentKind,
    entity: Option<&statefun_core::EntityConfig>,
) -> proto::Component {
    proto::Component {
        service_name: service_name.to_string(),
        component_type: component_kind_tag(component_type).to_string(),
        entity_type: entity.map(|e| e.entity_type.clone()).unwrap_or_default(),
        passivation_timeout_millis: entity.and_then(|e| e.passivation_timeout).unwrap_or(0),
        forward_headers: entity.map(|e| e.forward_headers.clone()).unwrap_or_default(),
        write_consistency: entity
            .and_then(|e| e.replicated_write_consistency)
            .map(write_consistency_to_wire)
            .unwrap_or_default()
            .to_string(),
        snapshot_every: entity.and_then(|e| e.snapshot_every).unwrap_or(0),
    }
}

pub fn component_to_wire(c: &ComponentDescription) -> proto::Component {
    component_fields_to_wire(&c.service_name, c.component_type, c.entity.as_ref())
}

pub fn discovery_response_to_wire(response: &discovery::DiscoveryResponse) -> proto::DiscoveryResponse {
    proto::DiscoveryResponse {
        service_info: Some(proto::ServiceInfo {
            service_name: response.service_info.service_name.clone(),
            service_version: response.service_info.service_version.clone(),
        }),
        descriptor_set: response.descriptor_set.clone(),
        components: response
            .components
            .iter()
            .map(|c| component_fields_to_wire(&c.service_name, c.component_type, c.entity.as_ref()))
            .collect(),
    }
}

pub fn proxy_info_from_wire(p: &proto::ProxyInfo) -> discovery::ProxyInfo {
    discovery::ProxyInfo {
        proxy_name: p.proxy_name.clone(),
        proxy_version: p.proxy_version.clone(),
        protocol_major_version: p.protocol_major_version,
        protocol_minor_version: p.protocol_minor_version,
    }
}

pub fn error_report_to_wire(report: &discovery::ErrorReport) -> proto::UserFunctionError {
    proto::UserFunctionError {
        code: report.code.clone(),
        message: report.message.clone(),
        detail: report.detail.clone(),
        location: Some(proto::SourceLocation {
            file_name: report.location.file.clone(),
            start_line: report.location.start_line as i32,
            start_col: report.location.start_col as i32,
            end_line: report.location.end_line as i32,
            end_col: report.location.end_col as i32,
        }),
    }
}

pub fn error_report_from_wire(e: &proto::UserFunctionError) -> discovery::ErrorReport {
    let location = e.location.clone().unwrap_or_default();
    discovery::ErrorReport {
        code: e.code.clone(),
        message: e.message.clone(),
        detail: e.detail.clone(),
        location: discovery::SourceLocation {
            file: location.file_name,
            start_line: location.start_line as u32,
            start_col: location.start_col as u32,
            end_line: location.end_line as u32,
            end_col: location.end_col as u32,
        },
        source_excerpt: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use statefun_core::EntityConfig;

    #[test]
    fn any_value_round_trips() {
        let v = AnyValue::new("type.googleapis.com/google.protobuf.BoolValue", vec![1]);
        let wire = any_to_wire(&v);
        let back = any_from_wire(&wire);
        assert_eq!(v, back);
    }

    #[test]
    fn metadata_round_trips_text_and_bytes() {
        let mut m = Metadata::new();
        m.insert("X-Trace", MetadataValue::Text("abc".to_string()));
        m.insert("X-Blob", MetadataValue::Bytes(vec![1, 2, 3]));

        let wire = metadata_to_wire(&m);
        assert_eq!(wire.entries.len(), 2);
        let back = metadata_from_wire(&wire);
        assert_eq!(back.iter().count(), 2);
    }

    #[test]
    fn message_reply_round_trips() {
        let reply = Reply::message(AnyValue::encode_i64(42));
        let wire = reply_to_wire(&reply);
        let back = reply_from_wire(&wire);
        assert_eq!(reply, back);
    }

    #[test]
    fn failure_reply_round_trips_status_code() {
        let reply = Reply::failure("bad state", Some(9));
        let wire = reply_to_wire(&reply);
        match wire.outcome {
            Some(proto::reply::Outcome::Failure(f)) => assert_eq!(f.grpc_status_code, 9),
            _ => panic!("expected a failure outcome"),
        }
        let back = reply_from_wire(&wire);
        assert!(back.is_failure());
    }

    #[test]
    fn no_reply_has_no_grpc_status_on_the_wire() {
        let reply = Reply::failure("unset", None);
        let wire = reply_to_wire(&reply);
        match wire.outcome {
            Some(proto::reply::Outcome::Failure(f)) => assert_eq!(f.grpc_status_code, 0),
            _ => panic!("expected a failure outcome"),
        }
    }

    #[test]
    fn component_carries_passivation_and_write_consistency() {
        let component = ComponentDescription::replicated_entity("com.example.Likes", "likes")
            .with_passivation_timeout(std::time::Duration::from_millis(10))
            .with_write_consistency(WriteConsistency::Majority);
        let wire = component_to_wire(&component);
        assert_eq!(wire.passivation_timeout_millis, 10);
        assert_eq!(wire.write_consistency, "majority");
        assert_eq!(wire.entity_type, "likes");
    }

    #[test]
    fn component_without_entity_config_has_zeroed_entity_fields() {
        let component = ComponentDescription::action("com.example.DoThing");
        let wire = component_to_wire(&component);
        assert_eq!(wire.entity_type, "");
        assert_eq!(wire.passivation_timeout_millis, 0);
        assert!(wire.forward_headers.is_empty());
    }

    #[test]
    fn entity_config_forward_headers_survive_the_wire() {
        let component = ComponentDescription::value_entity("com.example.Svc", "t")
            .with_forward_headers(["X-A".to_string(), "X-B".to_string()]);
        let wire = component_to_wire(&component);
        assert_eq!(wire.forward_headers, vec!["X-A", "X-B"]);
        let _: &EntityConfig = component.entity.as_ref().unwrap();
    }

    #[test]
    fn error_report_round_trips() {
        let report = discovery::ErrorReport {
            code: "KLX-00112".to_string(),
            message: "test message".to_string(),
            detail: "test details".to_string(),
            location: discovery::SourceLocation {
                file: "package.test.json".to_string(),
                start_line: 1,
                start_col: 3,
                end_line: 2,
                end_col: 5,
            },
            source_excerpt: Vec::new(),
        };
        let wire = error_report_to_wire(&report);
        let back = error_report_from_wire(&wire);
        assert_eq!(back.code, report.code);
        assert_eq!(back.location.end_col, report.location.end_col);
    }
}
