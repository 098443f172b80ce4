use beam_core::IceServerConfig;
use beam_server::ServerConfig;

use crate::integration::{init_tracing, start_server};
use crate::utils::TestWsClient;

#[tokio::test]
async fn test_connect_assigns_distinct_ids_and_ice_config() {
    init_tracing();

    let turn = IceServerConfig {
        urls: vec!["turn:turn.example.org:3478".into()],
        username: Some("user".into()),
        credential: Some("secret".into()),
    };
    let config = ServerConfig::default()
        .without_ice_servers()
        .with_ice_server(turn.clone());
    let addr = start_server(config).await;

    let a = TestWsClient::connect(addr).await.expect("client a");
    let b = TestWsClient::connect(addr).await.expect("client b");

    assert_ne!(a.peer_id, b.peer_id);
    assert_eq!(a.ice_servers, vec![turn.clone()]);
    assert_eq!(b.ice_servers, vec![turn]);
}
