//! Concurrent load through the router: no lost updates

use eventring::{Cluster, Config};
use std::time::Instant;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn stress_concurrent_updates() {
    let mut config = Config::default();
    config.router.bind_addr = "127.0.0.1:0".parse().unwrap();
    config.nodes.base_port = 31_000;
    let cluster = Cluster::launch(&config, 3).await.unwrap();
    let router = cluster.router_addr();
    let client = cluster.client();

    let workers = 16;
    let per_worker = 25;
    let start = Instant::now();

    let handles: Vec<_> = (0..workers)
        .map(|w| {
            tokio::spawn(async move {
                for i in 0..per_worker {
                    let hot = client.send(router, "update hot").await.unwrap();
                    assert_eq!(hot, "Update successful\n");
                    let own = format!("update worker-{}-{}", w, i % 5);
                    client.send(router, &own).await.unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap();
    }
    let elapsed = start.elapsed();

    assert_eq!(
        client.send(router, "get hot").await.unwrap(),
        format!("Count for hot: {}\n", workers * per_worker)
    );
    for w in 0..workers {
        assert_eq!(
            client.send(router, &format!("get worker-{}-0", w)).await.unwrap(),
            format!("Count for worker-{}-0: {}\n", w, per_worker / 5)
        );
    }

    println!("{} updates in {:?}", workers * per_worker * 2, elapsed);
    assert!(elapsed.as_secs_f64() < 60.0, "Updates too slow");
}
