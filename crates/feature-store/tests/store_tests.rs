//! Store and session behavior over scripted transports.

use std::sync::Arc;
use std::time::Duration;

use feature_store::{Credentials, FeaturePipeline, LayerFeatureStore, Session};
use geojson::{Feature, Value};
use projection::Mercator;
use test_utils::{
    assert_within_bbox, bbox, capabilities_response, collection, empty_collection,
    exception_response, json_response, point_feature, rect_feature, seoul_aoi, status_response,
    LoaderBehavior, MockScriptLoader, Scripted, ScriptedExchange,
};
use transport::{TransportClient, TransportConfig};
use wfs_common::{CrsCode, LayerCatalog, LayerKey, WfsError};
use wfs_protocol::{GetFeatureConfig, QueryBuilder};

fn transport_config() -> TransportConfig {
    TransportConfig {
        retry_delay: Duration::from_millis(1),
        fallback_timeout: Duration::from_millis(50),
        ..Default::default()
    }
}

fn session_with(
    exchange: &Arc<ScriptedExchange>,
    loader: LoaderBehavior,
    crs: CrsCode,
    preflight: bool,
) -> Session {
    let transport = TransportClient::new(
        transport_config(),
        exchange.clone(),
        Arc::new(MockScriptLoader::new(loader)),
    );
    let builder = QueryBuilder::new(GetFeatureConfig {
        crs,
        ..Default::default()
    });
    let store = LayerFeatureStore::new(
        LayerCatalog::default(),
        FeaturePipeline::new(builder, transport),
    )
    .with_preflight(preflight);
    Session::new(store, Credentials::new("KEY", "example.org"))
}

async fn seoul_session(exchange: &Arc<ScriptedExchange>) -> Session {
    let session = session_with(exchange, LoaderBehavior::Hang, CrsCode::Epsg900913, false);
    session.set_aoi(seoul_aoi()).await;
    session
}

/// Axis-aligned rectangle given in degrees, expressed in Mercator meters.
fn mercator_rect(id: &str, lon0: f64, lat0: f64, lon1: f64, lat1: f64) -> Feature {
    let m = Mercator::default();
    let (x0, y0) = m.forward(lon0, lat0);
    let (x1, y1) = m.forward(lon1, lat1);
    rect_feature(id, x0, y0, x1, y1)
}

fn urban() -> LayerKey {
    LayerKey::new("urban")
}

#[tokio::test]
async fn test_refetch_overwrites_with_empty_result() {
    let exchange = Arc::new(ScriptedExchange::new(vec![
        Scripted::Respond(json_response(&collection(vec![mercator_rect(
            "zone", 126.95, 37.52, 127.05, 37.58,
        )]))),
        Scripted::Respond(json_response(&empty_collection())),
    ]));
    let session = seoul_session(&exchange).await;
    let store = session.store();

    assert!(!store.is_fetched(&urban()).await.unwrap());
    assert_eq!(store.count(&urban()).await.unwrap(), None);

    session.fetch_layer(&urban()).await.unwrap();
    assert!(store.is_fetched(&urban()).await.unwrap());
    assert_eq!(store.count(&urban()).await.unwrap(), Some(1));

    session.fetch_layer(&urban()).await.unwrap();
    assert!(store.is_fetched(&urban()).await.unwrap());
    assert_eq!(store.count(&urban()).await.unwrap(), Some(0));
    assert_eq!(exchange.request_count(), 2);
}

#[tokio::test]
async fn test_result_is_geographic_and_clipped() {
    // Extends well east of the AOI
    let exchange = Arc::new(ScriptedExchange::always(Scripted::Respond(json_response(
        &collection(vec![mercator_rect("wide", 127.0, 37.52, 127.5, 37.58)]),
    ))));
    let session = seoul_session(&exchange).await;

    let fc = session.fetch_layer(&urban()).await.unwrap();

    assert_eq!(fc.features.len(), 1);
    let (min_x, min_y, max_x, max_y) = bbox::SEOUL;
    match &fc.features[0].geometry.as_ref().unwrap().value {
        Value::Polygon(rings) => {
            for p in rings.iter().flatten() {
                assert_within_bbox!((p[0], p[1]), (min_x, min_y, max_x, max_y), 1e-6);
            }
        }
        other => panic!("expected Polygon, got {:?}", other),
    }
}

#[tokio::test]
async fn test_failed_fetch_leaves_record_untouched() {
    let exchange = Arc::new(ScriptedExchange::new(vec![
        Scripted::Respond(json_response(&collection(vec![mercator_rect(
            "zone", 126.95, 37.52, 127.05, 37.58,
        )]))),
        Scripted::Respond(exception_response("INCORRECT_KEY")),
    ]));
    let session = seoul_session(&exchange).await;

    session.fetch_layer(&urban()).await.unwrap();
    let err = session.fetch_layer(&urban()).await.unwrap_err();

    match err {
        WfsError::FormatError { message } => assert_eq!(message, "INCORRECT_KEY"),
        other => panic!("expected format error, got {:?}", other),
    }
    assert_eq!(session.store().count(&urban()).await.unwrap(), Some(1));
}

#[tokio::test]
async fn test_unknown_layer_rejected_without_request() {
    let exchange = Arc::new(ScriptedExchange::always(Scripted::unreachable()));
    let session = seoul_session(&exchange).await;

    let err = session
        .fetch_layer(&LayerKey::new("rivers"))
        .await
        .unwrap_err();

    assert!(matches!(err, WfsError::InvalidInput(_)));
    assert!(session.store().is_visible(&LayerKey::new("rivers")).await.is_err());
    assert_eq!(exchange.request_count(), 0);
}

#[tokio::test]
async fn test_fetch_without_aoi() {
    let exchange = Arc::new(ScriptedExchange::always(Scripted::unreachable()));
    let session = session_with(&exchange, LoaderBehavior::Hang, CrsCode::Epsg900913, false);

    let err = session.fetch_layer(&urban()).await.unwrap_err();

    assert!(matches!(err, WfsError::InvalidInput(_)));
    assert_eq!(exchange.request_count(), 0);
}

#[tokio::test]
async fn test_missing_credential_sends_nothing() {
    let exchange = Arc::new(ScriptedExchange::always(Scripted::unreachable()));
    let transport = TransportClient::new(
        transport_config(),
        exchange.clone(),
        Arc::new(MockScriptLoader::new(LoaderBehavior::Hang)),
    );
    let store = LayerFeatureStore::new(
        LayerCatalog::default(),
        FeaturePipeline::new(QueryBuilder::default(), transport),
    );
    let session = Session::new(store, Credentials::new("  ", "example.org"));
    session.set_aoi(seoul_aoi()).await;

    let err = session.fetch_layer(&urban()).await.unwrap_err();

    assert!(matches!(err, WfsError::MissingCredential));
    assert_eq!(exchange.request_count(), 0);
    assert!(!session.store().is_fetched(&urban()).await.unwrap());
}

#[tokio::test]
async fn test_input_errors_skip_preflight() {
    let exchange = Arc::new(ScriptedExchange::always(Scripted::unreachable()));
    let transport = TransportClient::new(
        transport_config(),
        exchange.clone(),
        Arc::new(MockScriptLoader::new(LoaderBehavior::Hang)),
    );
    let store = LayerFeatureStore::new(
        LayerCatalog::default(),
        FeaturePipeline::new(QueryBuilder::default(), transport),
    )
    .with_preflight(true);
    let session = Session::new(store, Credentials::new("  ", "example.org"));

    let err = session
        .store()
        .fetch(&urban(), Some(&seoul_aoi()), session.credentials())
        .await
        .unwrap_err();
    assert!(matches!(err, WfsError::MissingCredential));

    let err = session
        .store()
        .fetch(&urban(), None, session.credentials())
        .await
        .unwrap_err();
    assert!(matches!(err, WfsError::InvalidInput(_)));

    assert_eq!(exchange.request_count(), 0);
    assert!(session.store().preflight().cached().await.is_none());
}

#[tokio::test]
async fn test_fetch_selected_stops_at_first_error() {
    let exchange = Arc::new(ScriptedExchange::new(vec![
        Scripted::Respond(json_response(&empty_collection())),
        Scripted::Respond(status_response(500, "Internal Server Error")),
    ]));
    let session = seoul_session(&exchange).await;
    let keys = vec![
        LayerKey::new("admin"),
        urban(),
        LayerKey::new("greenbelt"),
    ];

    let err = session.fetch_selected(&keys).await.unwrap_err();

    assert!(matches!(err, WfsError::UpstreamError { status: 500, .. }));
    // One request for admin, a full retry budget for urban
    assert_eq!(exchange.request_count(), 4);

    let store = session.store();
    assert!(store.is_fetched(&keys[0]).await.unwrap());
    assert!(store.is_visible(&keys[0]).await.unwrap());
    assert!(!store.is_fetched(&keys[1]).await.unwrap());
    assert!(!store.is_fetched(&keys[2]).await.unwrap());
    assert!(!store.is_visible(&keys[2]).await.unwrap());
}

#[tokio::test]
async fn test_reset_and_clear() {
    let exchange = Arc::new(ScriptedExchange::always(Scripted::Respond(json_response(
        &empty_collection(),
    ))));
    let session = seoul_session(&exchange).await;
    let admin = LayerKey::new("admin");

    session
        .fetch_selected(&[urban(), admin.clone()])
        .await
        .unwrap();
    let store = session.store();

    store.reset(&urban()).await.unwrap();
    assert!(!store.is_fetched(&urban()).await.unwrap());
    assert!(store.is_fetched(&admin).await.unwrap());
    // Visibility is independent of data
    assert!(store.is_visible(&urban()).await.unwrap());

    session.clear().await;
    assert!(!store.is_fetched(&admin).await.unwrap());
    assert!(!store.is_visible(&admin).await.unwrap());
    assert!(session.aoi().await.is_some());

    let statuses = store.statuses().await;
    assert_eq!(statuses.len(), 6);
    assert!(statuses.iter().all(|s| !s.fetched && !s.visible));
}

#[tokio::test]
async fn test_geographic_request_skips_reprojection() {
    let exchange = Arc::new(ScriptedExchange::always(Scripted::Respond(json_response(
        &collection(vec![point_feature("station", 127.0, 37.55)]),
    ))));
    let session = session_with(&exchange, LoaderBehavior::Hang, CrsCode::Epsg4326, false);
    session.set_aoi(seoul_aoi()).await;

    let fc = session.fetch_layer(&urban()).await.unwrap();

    assert_eq!(fc.features.len(), 1);
    let request = &exchange.requests()[0];
    assert_eq!(request.param("SRSNAME"), Some("EPSG:4326"));
    assert_eq!(
        fc.features[0].geometry.as_ref().unwrap().value,
        Value::Point(vec![127.0, 37.55])
    );
}

#[tokio::test]
async fn test_fallback_payload_flows_through_pipeline() {
    let m = Mercator::default();
    let (x, y) = m.forward(127.0, 37.55);
    let payload = serde_json::to_value(collection(vec![point_feature("p", x, y)])).unwrap();
    let exchange = Arc::new(ScriptedExchange::always(Scripted::unreachable()));
    let session = session_with(
        &exchange,
        LoaderBehavior::Invoke(payload),
        CrsCode::Epsg900913,
        false,
    );
    session.set_aoi(seoul_aoi()).await;

    let fc = session.fetch_and_show(&urban()).await.unwrap();

    assert_eq!(fc.features.len(), 1);
    assert!(session.store().is_visible(&urban()).await.unwrap());
}

#[tokio::test]
async fn test_preflight_rejects_unadvertised_type_name() {
    let exchange = Arc::new(ScriptedExchange::new(vec![
        Scripted::Respond(capabilities_response(&["lt_c_uq121", "lt_c_adsigg"])),
        Scripted::Respond(json_response(&empty_collection())),
    ]));
    let session = session_with(&exchange, LoaderBehavior::Hang, CrsCode::Epsg900913, true);
    session.set_aoi(seoul_aoi()).await;

    session.fetch_layer(&urban()).await.unwrap();
    let err = session
        .fetch_layer(&LayerKey::new("greenbelt"))
        .await
        .unwrap_err();

    assert!(matches!(err, WfsError::InvalidInput(_)));
    // Capabilities once, then the urban GetFeature
    assert_eq!(exchange.request_count(), 2);
    let requests = exchange.requests();
    assert_eq!(requests[0].param("request"), Some("GetCapabilities"));
    assert!(session.store().preflight().cached().await.is_some());
}

#[tokio::test]
async fn test_preflight_failure_skips_validation() {
    let exchange = Arc::new(ScriptedExchange::new(vec![
        Scripted::Respond(status_response(503, "unavailable")),
        Scripted::Respond(status_response(503, "unavailable")),
        Scripted::Respond(status_response(503, "unavailable")),
        Scripted::Respond(json_response(&empty_collection())),
    ]));
    let session = session_with(&exchange, LoaderBehavior::Hang, CrsCode::Epsg900913, true);
    session.set_aoi(seoul_aoi()).await;

    session.fetch_layer(&urban()).await.unwrap();

    assert!(session.store().preflight().cached().await.is_none());
    assert_eq!(exchange.request_count(), 4);
}
