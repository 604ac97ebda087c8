//! A dead node only affects the keys it owns

use eventring::{NodeClient, NodeHandle, NodeServer, RoutingServer, SharedRing};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

async fn spawn_node(ring: &SharedRing, id: u32) -> (SocketAddr, JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let task = tokio::spawn(async move {
        let _ = NodeServer::new(id).serve_listener(listener).await;
    });
    ring.add_node(NodeHandle::new(id, addr));
    (addr, task)
}

#[tokio::test]
async fn test_node_failure_isolated_to_owned_keys() {
    let ring = SharedRing::new(3);
    let (_, alive) = spawn_node(&ring, 0).await;
    let (dead_addr, dead) = spawn_node(&ring, 1).await;
    let router = RoutingServer::new(ring.clone(), NodeClient::new());

    // Find one event per node
    let events: Vec<String> = (0..1000).map(|i| format!("event-{}", i)).collect();
    let on_dead = events
        .iter()
        .find(|e| ring.resolve(e).unwrap().addr == dead_addr)
        .unwrap();
    let on_alive = events
        .iter()
        .find(|e| ring.resolve(e).unwrap().addr != dead_addr)
        .unwrap();

    for event in [on_dead, on_alive] {
        assert_eq!(
            router.handle_request(&format!("update {}", event)).await,
            "Update successful\n"
        );
    }

    dead.abort();
    let _ = dead.await;

    assert_eq!(
        router.handle_request(&format!("get {}", on_dead)).await,
        "Event not found\n"
    );
    assert_eq!(
        router.handle_request(&format!("update {}", on_dead)).await,
        "Error handling request\n"
    );
    assert_eq!(
        router.handle_request(&format!("get {}", on_alive)).await,
        format!("Count for {}: 1\n", on_alive)
    );

    let status = router.handle_request("status").await;
    assert!(status.contains(&format!("Node 1 on {}: unreachable\n", dead_addr)));

    alive.abort();
}
