//! gRPC adapter for the discovery handshake: wraps [`statefun_core::DiscoveryHandler`]
//! behind the generated `Discovery` service trait.

use statefun_core::discovery::DiscoveryHandler;
use statefun_wire::convert::{discovery_response_to_wire, error_report_from_wire, proxy_info_from_wire};
use statefun_wire::proto::discovery_server::Discovery;
use statefun_wire::proto::{DiscoveryResponse, ProxyInfo, ReportErrorAck, UserFunctionError};
use std::sync::Arc;
use tonic::{Request, Response, Status};

pub struct DiscoveryService {
    handler: Arc<DiscoveryHandler>,
}

impl DiscoveryService {
    pub fn new(handler: Arc<DiscoveryHandler>) -> Self {
        Self { handler }
    }
}

#[tonic::async_trait]
impl Discovery for DiscoveryService {
    async fn discover(
        &self,
        request: Request<ProxyInfo>,
    ) -> Result<Response<DiscoveryResponse>, Status> {
        let info = proxy_info_from_wire(request.get_ref());
        let response = self.handler.discover(&info);
        Ok(Response::new(discovery_response_to_wire(&response)))
    }

    async fn report_error(
        &self,
        request: Request<UserFunctionError>,
    ) -> Result<Response<ReportErrorAck>, Status> {
        let report = error_report_from_wire(request.get_ref());
        let formatted = self.handler.report_error(&report);
        tracing::error!("{formatted}");
        Ok(Response::new(ReportErrorAck {}))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use statefun_core::{ComponentDescription, ComponentRegistry};
    use statefun_wire::proto::SourceLocation;

    fn handler() -> Arc<DiscoveryHandler> {
        let mut registry = ComponentRegistry::new();
        registry.register(ComponentDescription::value_entity("com.example.Counter", "counter"));
        Arc::new(DiscoveryHandler::new(
            statefun_core::discovery::ServiceInfo {
                service_name: "test-service".to_string(),
                service_version: "0.1.0".to_string(),
            },
            vec![1, 2, 3],
            registry.finish(),
        ))
    }

    #[tokio::test]
    async fn discover_returns_service_info_and_components() {
        let service = DiscoveryService::new(handler());
        let request = Request::new(ProxyInfo {
            proxy_name: "test-proxy".to_string(),
            proxy_version: "1.0".to_string(),
            protocol_major_version: 1,
            protocol_minor_version: 0,
        });

        let response = service.discover(request).await.unwrap().into_inner();
        assert_eq!(response.service_info.unwrap().service_name, "test-service");
        assert_eq!(response.descriptor_set, vec![1, 2, 3]);
        assert_eq!(response.components.len(), 1);
        assert_eq!(response.components[0].entity_type, "counter");
    }

    #[tokio::test]
    async fn report_error_acknowledges_without_failing() {
        let service = DiscoveryService::new(handler());
        let request = Request::new(UserFunctionError {
            code: "KLX-00112".to_string(),
            message: "bad config".to_string(),
            detail: "field is missing".to_string(),
            location: Some(SourceLocation {
                file_name: "app.json".to_string(),
                start_line: 1,
                start_col: 1,
                end_line: 1,
                end_col: 5,
            }),
        });

        service.report_error(request).await.unwrap();
    }
}
