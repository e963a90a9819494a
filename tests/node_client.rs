//! End-to-end tests of `NodeClient` over real transports against mock nodes.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use alloy::primitives::{hex, Address, B256};
use node_client::blockchain::transaction::TX_TYPE_INVOKE;
use node_client::blockchain::{TxSignature, UnsignedTransaction};
use node_client::config::ClientConfig;
use node_client::layer2::{Layer2Client, RangeProof};
use node_client::layer2::proof::{PathToLeaf, ProofLeafNode};
use node_client::transport::{RestTransport, RpcTransport, WsTransport};
use node_client::{NodeClient, TransportKind, TransportSlot};
use serde_json::{json, Value};

mod common;

const TX_HASH: &str = "9b3e1d6c2f7a0e4b8d5c3a1f0e9d8c7b6a5f4e3d2c1b0a9f8e7d6c5b4a3f2e1d";
const TIMEOUT: Duration = Duration::from_secs(5);

fn signed_tx() -> UnsignedTransaction {
    let mut tx = UnsignedTransaction::new(TX_TYPE_INVOKE, vec![0x00]).with_payer(Address::ZERO);
    tx.add_signature(TxSignature::single(vec![0x02; 33], vec![0x01; 64]));
    tx
}

#[tokio::test]
async fn test_rpc_end_to_end() {
    let seen: Arc<Mutex<Vec<(String, Value)>>> = Arc::default();
    let log = seen.clone();
    let addr = common::start_rpc_node(move |method, params| {
        log.lock().unwrap().push((method.to_string(), params.clone()));
        match method {
            "getblockcount" => (0, json!(101)),
            "getblock" => (0, json!({ "Hash": "aa", "Header": { "Height": params[0] } })),
            "getstorage" => (0, json!("0a0b")),
            "sendrawtransaction" => (0, json!(TX_HASH)),
            _ => (42001, Value::Null),
        }
    })
    .await;

    let mut client = NodeClient::new();
    client.set_transport(
        TransportSlot::Rpc,
        Arc::new(RpcTransport::new(&common::http_url(addr), TIMEOUT).unwrap()),
    );

    // The node reports a block count; the client reports the tip height.
    assert_eq!(client.get_current_block_height().await.unwrap(), 100);

    let block = client.get_block_by_height(7).await.unwrap();
    assert_eq!(block.header.height, 7);

    let value = client.get_storage("0100000000000000000000000000000000000000", b"k").await.unwrap();
    assert_eq!(value, vec![0x0a, 0x0b]);

    let hash = client.send_transaction(signed_tx()).await.unwrap();
    assert_eq!(hex::encode(hash), TX_HASH);

    let seen = seen.lock().unwrap();
    let methods: Vec<_> = seen.iter().map(|(m, _)| m.as_str()).collect();
    assert_eq!(methods, vec!["getblockcount", "getblock", "getstorage", "sendrawtransaction"]);
    assert_eq!(seen[2].1[1], json!(hex::encode(b"k")));
}

#[tokio::test]
async fn test_rpc_request_ids_follow_counter() {
    let (addr, ids) = common::start_recording_rpc_node(json!(1)).await;

    let mut client = NodeClient::new();
    client.set_transport(
        TransportSlot::Rpc,
        Arc::new(RpcTransport::new(&common::http_url(addr), TIMEOUT).unwrap()),
    );
    for _ in 0..3 {
        client.get_network_id().await.unwrap();
    }

    assert_eq!(*ids.lock().unwrap(), vec![json!("1"), json!("2"), json!("3")]);
    assert_eq!(client.next_qid(), "4");
}

#[tokio::test]
async fn test_rest_end_to_end() {
    let seen: Arc<Mutex<Vec<(String, Value)>>> = Arc::default();
    let log = seen.clone();
    let addr = common::start_rest_node(move |path, body| {
        log.lock().unwrap().push((path.to_string(), body.clone()));
        match path {
            "/block/height" => (0, json!(55)),
            "/block/details/height/55" => (0, json!({ "Hash": "bb", "Header": { "Height": 55 } })),
            "/smartcode/event/transactions/55" => (0, json!("")),
            "/mempool/txcount" => (0, json!([3, 4])),
            p if p.starts_with("/transaction?preExec=1") => {
                (0, json!({ "State": 1, "Gas": 20000, "Result": "01", "Notify": [] }))
            }
            _ => (41001, Value::Null),
        }
    })
    .await;

    let mut client = NodeClient::new();
    client.set_transport(
        TransportSlot::Rest,
        Arc::new(RestTransport::new(&common::http_url(addr), TIMEOUT).unwrap()),
    );

    let height = client.get_current_block_height().await.unwrap();
    assert_eq!(height, 55);
    assert_eq!(client.get_block_by_height(height).await.unwrap().hash, "bb");
    assert!(client.get_smart_contract_events_by_block(height).await.unwrap().is_empty());

    let count = client.get_mempool_tx_count().await.unwrap();
    assert_eq!((count.verified, count.unverified), (3, 4));

    let result = client.pre_exec_transaction(signed_tx()).await.unwrap();
    assert!(result.succeeded());
    assert_eq!(result.gas, 20000);

    let seen = seen.lock().unwrap();
    let (_, submitted) = seen.last().unwrap();
    assert_eq!(submitted["Action"], "sendrawtransaction");
    assert!(submitted["Data"].as_str().is_some_and(|data| !data.is_empty()));
}

#[tokio::test]
async fn test_ws_responses_matched_by_id() {
    // The node holds two frames and answers them in reverse order.
    let addr = common::start_ws_node(2, |action, frame| match action {
        "getblockhash" => (0, json!(format!("{:064x}", frame["Height"].as_u64().unwrap()))),
        "getversion" => (0, json!("v1.2.3")),
        _ => (41001, Value::Null),
    })
    .await;

    let ws = Arc::new(WsTransport::connect(&common::ws_url(addr), TIMEOUT).await.unwrap());
    let mut client = NodeClient::new();
    client.set_transport(TransportSlot::WebSocket, ws.clone());

    let (hash, version) = tokio::join!(client.get_block_hash(9), client.get_version());
    assert_eq!(hash.unwrap(), B256::with_last_byte(9));
    assert_eq!(version.unwrap(), "v1.2.3");
    assert_eq!(ws.pending_requests(), 0);
    assert!(!ws.is_closed());
}

#[tokio::test]
async fn test_ws_concurrent_calls() {
    let addr = common::start_ws_node(1, |_, frame| {
        (0, json!(format!("{:064x}", frame["Height"].as_u64().unwrap())))
    })
    .await;

    let mut client = NodeClient::new();
    client.set_transport(
        TransportSlot::WebSocket,
        Arc::new(WsTransport::connect(&common::ws_url(addr), TIMEOUT).await.unwrap()),
    );

    let mut tasks = Vec::new();
    for height in 0..16u8 {
        let client = client.clone();
        tasks.push(tokio::spawn(async move {
            (height, client.get_block_hash(height.into()).await)
        }));
    }
    for task in tasks {
        let (height, hash) = task.await.unwrap();
        assert_eq!(hash.unwrap(), B256::with_last_byte(height));
    }
    assert_eq!(client.correlation_ids().current(), 16);
}

#[tokio::test]
async fn test_connect_pins_configured_default() {
    let rpc = common::start_rpc_node(|_, _| (0, json!(11))).await;
    let rest = common::start_rest_node(|_, _| (0, json!(20))).await;

    let mut config = ClientConfig::default();
    config.transports.rpc_url = Some(common::http_url(rpc));
    config.transports.rest_url = Some(common::http_url(rest));

    let client = NodeClient::connect(&config).await.unwrap();
    assert_eq!(client.active_transport().unwrap().kind(), TransportKind::Rpc);
    assert_eq!(client.get_current_block_height().await.unwrap(), 10);

    config.transports.default = Some(TransportKind::Rest);
    let client = NodeClient::connect(&config).await.unwrap();
    assert_eq!(client.active_transport().unwrap().kind(), TransportKind::Rest);
    assert_eq!(client.get_current_block_height().await.unwrap(), 20);
}

#[tokio::test]
async fn test_wait_for_blocks_over_rpc() {
    let polls = Arc::new(Mutex::new(0u64));
    let counter = polls.clone();
    let addr = common::start_rpc_node(move |_, _| {
        let mut polls = counter.lock().unwrap();
        *polls += 1;
        // Block count grows by one per poll.
        (0, json!(10 + *polls))
    })
    .await;

    let mut client = NodeClient::new();
    client.set_transport(
        TransportSlot::Rpc,
        Arc::new(RpcTransport::new(&common::http_url(addr), TIMEOUT).unwrap()),
    );

    let height = client
        .wait_for_blocks(Duration::from_secs(5), Some(1))
        .await
        .unwrap();
    assert_eq!(height, 11);
    assert_eq!(*polls.lock().unwrap(), 2);
}

#[tokio::test]
async fn test_layer2_store_proof_round_trip() {
    let leaf = ProofLeafNode::new(b"balance", b"100", 4);
    let root = leaf.hash();
    let proof = RangeProof {
        left_path: PathToLeaf::default(),
        inner_nodes: vec![],
        leaves: vec![leaf],
    }
    .encode();
    let proof_hex = hex::encode(&proof);

    let addr = common::start_rest_node(move |path, _| {
        if path.starts_with("/storeproof/") {
            (0, json!({ "Value": hex::encode(b"100"), "Proof": proof_hex, "Height": 4 }))
        } else {
            (41001, Value::Null)
        }
    })
    .await;

    let mut client = NodeClient::new();
    client.set_transport(
        TransportSlot::Rest,
        Arc::new(RestTransport::new(&common::http_url(addr), TIMEOUT).unwrap()),
    );
    let layer2 = Layer2Client::new(client);

    let key = Layer2Client::get_layer2_store_key("", b"balance").unwrap();
    let stored = layer2.get_layer2_store_proof(&key).await.unwrap();
    let value = stored.value_bytes().unwrap();
    Layer2Client::verify_layer2_store_proof(&key, &value, &stored.proof_bytes().unwrap(), &root)
        .unwrap();
    assert!(Layer2Client::verify_layer2_store_proof(&key, b"999", &proof, &root).is_err());
}
