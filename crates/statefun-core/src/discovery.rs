//! Discovery handshake: responds to the proxy's `Discover` call with service
//! info, the compiled descriptor set, and component descriptions; formats
//! `ReportError` diagnostics for user-visible failures.

use crate::component::{ComponentDescription, ComponentKind, EntityConfig};
use std::sync::Arc;

pub const FRAMEWORK_BRAND: &str = "Kalix";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServiceInfo {
    pub service_name: String,
    pub service_version: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProxyInfo {
    pub proxy_name: String,
    pub proxy_version: String,
    pub protocol_major_version: u32,
    pub protocol_minor_version: u32,
}

/// Hostname, port, and identification metadata the proxy hands each
/// component before it starts, so components can wire outbound gRPC clients.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PreStartInfo {
    pub proxy_hostname: String,
    pub proxy_port: u16,
    pub identification_info: String,
}

/// A `preStart(proxyHostname, proxyPort, identificationInfo)` hook run once
/// per component before the discovery response is returned.
pub trait PreStart: Send + Sync {
    fn pre_start(&self, info: &PreStartInfo);
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ComponentInfo {
    pub service_name: String,
    pub component_type: ComponentKind,
    pub entity: Option<EntityConfig>,
}

impl From<&ComponentDescription> for ComponentInfo {
    fn from(c: &ComponentDescription) -> Self {
        Self {
            service_name: c.service_name.clone(),
            component_type: c.component_type,
            entity: c.entity.clone(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DiscoveryResponse {
    pub service_info: ServiceInfo,
    pub descriptor_set: Vec<u8>,
    pub components: Vec<ComponentInfo>,
}

pub struct DiscoveryHandler {
    service_info: ServiceInfo,
    descriptor_set: Vec<u8>,
    components: Arc<[ComponentDescription]>,
    pre_start_hooks: Vec<Box<dyn PreStart>>,
}

impl DiscoveryHandler {
    pub fn new(
        service_info: ServiceInfo,
        descriptor_set: Vec<u8>,
        components: Arc<[ComponentDescription]>,
    ) -> Self {
        Self {
            service_info,
            descriptor_set,
            components,
            pre_start_hooks: Vec::new(),
        }
    }

    pub fn with_pre_start_hook(mut self, hook: Box<dyn PreStart>) -> Self {
        self.pre_start_hooks.push(hook);
        self
    }

    /// Handles `Discover(proxyInfo)`: runs every registered `preStart` hook,
    /// then returns the service info, descriptor set, and component list.
    pub fn discover(&self, info: &ProxyInfo) -> DiscoveryResponse {
        tracing::info!(
            proxy = %info.proxy_name,
            version = %info.proxy_version,
            "handling discovery request"
        );
        let pre_start_info = PreStartInfo {
            proxy_hostname: info.proxy_name.clone(),
            proxy_port: 0,
            identification_info: format!("{}/{}", info.proxy_name, info.proxy_version),
        };
        for hook in &self.pre_start_hooks {
            hook.pre_start(&pre_start_info);
        }
        DiscoveryResponse {
            service_info: self.service_info.clone(),
            descriptor_set: self.descriptor_set.clone(),
            components: self.components.iter().map(ComponentInfo::from).collect(),
        }
    }

    /// Handles `ReportError(userError)`, producing the bit-stable diagnostic
    /// text described by [`format_error_report`].
    pub fn report_error(&self, report: &ErrorReport) -> String {
        format_error_report(report)
    }
}

/// Maps an error code's prefix to a documentation URL fragment. An unknown
/// prefix resolves to the empty string.
fn doc_url(code: &str) -> String {
    let prefix = code.split('-').next().unwrap_or(code);
    let (base, fragment) = match prefix {
        "KLX" => ("https://docs.kalix.io/javascript/views.html", "#changing"),
        "AS" => ("https://docs.kalix.io/javascript/any-support.html", ""),
        _ => return String::new(),
    };
    format!("{base}{fragment}")
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceLocation {
    pub file: String,
    pub start_line: u32,
    pub start_col: u32,
    pub end_line: u32,
    pub end_col: u32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ErrorReport {
    pub code: String,
    pub message: String,
    pub detail: String,
    pub location: SourceLocation,
    /// The source lines spanned by `location`, already extracted by the caller.
    pub source_excerpt: Vec<String>,
}

/// Produces the multi-line diagnostic: a header line naming the framework,
/// the error code and message; a blank line; the detail and doc link; a
/// blank line; and a source excerpt anchored at the location's end position.
pub fn format_error_report(report: &ErrorReport) -> String {
    let url = doc_url(&report.code);
    let line = report.location.end_line;
    let col = report.location.end_col.saturating_sub(1);
    let excerpt = report
        .source_excerpt
        .iter()
        .map(|l| format!("  {l}"))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Error reported from {brand}: {code} {message}\n\n{detail}\nSee documentation: {url}\n\nAt {file}:{line}:{col}:\n{excerpt}",
        brand = FRAMEWORK_BRAND,
        code = report.code,
        message = report.message,
        detail = report.detail,
        file = report.location.file,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_report_matches_exact_format() {
        let report = ErrorReport {
            code: "KLX-00112".to_string(),
            message: "test message".to_string(),
            detail: "test details".to_string(),
            location: SourceLocation {
                file: "package.test.json".to_string(),
                start_line: 1,
                start_col: 3,
                end_line: 2,
                end_col: 5,
            },
            source_excerpt: vec![
                "\"name\": \"some-name\",".to_string(),
                "\"version\": \"some-version\"".to_string(),
            ],
        };

        let expected = "Error reported from Kalix: KLX-00112 test message\n\n\
test details\n\
See documentation: https://docs.kalix.io/javascript/views.html#changing\n\n\
At package.test.json:2:4:\n  \
\"name\": \"some-name\",\n  \
\"version\": \"some-version\"";

        assert_eq!(format_error_report(&report), expected);
    }

    #[test]
    fn unknown_code_prefix_yields_empty_url() {
        assert_eq!(doc_url("ZZZ-001"), "");
    }
}
