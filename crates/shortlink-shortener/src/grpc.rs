use crate::error::ShortenerError;
use crate::shortener::Shortener;
use shortlink_proto_schema::v1 as proto;
use shortlink_proto_schema::v1::link_shortener_server::LinkShortener;
use std::sync::Arc;
use tonic::{Request, Response, Status};
use tracing::{error, warn};

/// gRPC adapter exposing a [`Shortener`] as the `shortener.v1.LinkShortener`
/// service.
pub struct LinkShortenerGrpcServer<T> {
    shortener: Arc<T>,
}

impl<T: Shortener> LinkShortenerGrpcServer<T> {
    pub fn new(shortener: T) -> Self {
        Self {
            shortener: Arc::new(shortener),
        }
    }
}

fn into_status(operation: &'static str, err: ShortenerError) -> Status {
    if err.is_client_error() {
        warn!(operation, error = %err, "request rejected");
    } else {
        error!(operation, error = %err, "request failed");
    }
    err.into()
}

#[tonic::async_trait]
impl<T: Shortener> LinkShortener for LinkShortenerGrpcServer<T> {
    async fn create_short_link(
        &self,
        request: Request<proto::CreateShortLinkRequest>,
    ) -> Result<Response<proto::CreateShortLinkResponse>, Status> {
        let request = request.into_inner();

        let short = self
            .shortener
            .shorten(&request.original)
            .await
            .map_err(|err| into_status("create_short_link", err))?;

        Ok(Response::new(proto::CreateShortLinkResponse { short }))
    }

    async fn get_original_link(
        &self,
        request: Request<proto::GetOriginalLinkRequest>,
    ) -> Result<Response<proto::GetOriginalLinkResponse>, Status> {
        let request = request.into_inner();

        let original = self
            .shortener
            .resolve(&request.short)
            .await
            .map_err(|err| into_status("get_original_link", err))?;

        Ok(Response::new(proto::GetOriginalLinkResponse { original }))
    }
}
