use std::net::SocketAddr;

use automata::{codec, Alphabet, Dfa};
use automata_oracle::{DfaOracle, OracleServer, ServerConfig};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

fn ends_in_one() -> Dfa {
    let mut builder = Dfa::builder(Alphabet::binary());
    let reject = builder.state(false);
    let accept = builder.state(true);
    builder
        .transition(reject, '0', reject)
        .transition(reject, '1', accept)
        .transition(accept, '0', reject)
        .transition(accept, '1', accept);
    builder.build().unwrap()
}

fn reject_all() -> Dfa {
    let mut builder = Dfa::builder(Alphabet::binary());
    let sink = builder.state(false);
    builder.transition(sink, '0', sink).transition(sink, '1', sink);
    builder.build().unwrap()
}

async fn start(target: Dfa) -> SocketAddr {
    let config = ServerConfig {
        port: 0,
        ..ServerConfig::default()
    };
    let server = OracleServer::bind(DfaOracle::new(target), config)
        .await
        .expect("binding an ephemeral port succeeds");
    let addr = server.local_addr();
    tokio::spawn(server.run());
    addr
}

async fn connect(addr: SocketAddr) -> TcpStream {
    TcpStream::connect(("127.0.0.1", addr.port()))
        .await
        .expect("server accepts connections")
}

async fn roundtrip(stream: &mut TcpStream, request: &[u8]) -> String {
    stream.write_all(request).await.expect("request is written");
    let mut buffer = [0u8; 8192];
    let received = stream.read(&mut buffer).await.expect("response arrives");
    String::from_utf8(buffer[..received].to_vec()).expect("response is utf-8")
}

#[tokio::test]
async fn membership_queries_answer_like_the_target() {
    let addr = start(ends_in_one()).await;
    let mut stream = connect(addr).await;
    assert_eq!(roundtrip(&mut stream, b"mq 101").await, "true");
    assert_eq!(roundtrip(&mut stream, b"mq 100").await, "false");
    assert_eq!(roundtrip(&mut stream, b"mq 1").await, "true");
    assert_eq!(roundtrip(&mut stream, b"mq ").await, "false");
}

#[tokio::test]
async fn end_closes_the_connection_without_a_response() {
    let addr = start(ends_in_one()).await;
    let mut stream = connect(addr).await;
    assert_eq!(roundtrip(&mut stream, b"mq 0").await, "false");
    stream.write_all(b"end").await.unwrap();
    let mut buffer = [0u8; 16];
    assert_eq!(stream.read(&mut buffer).await.unwrap(), 0);
}

#[tokio::test]
async fn equivalence_returns_the_shortest_counterexample() {
    let addr = start(ends_in_one()).await;
    let mut stream = connect(addr).await;

    let mut request = b"eq ".to_vec();
    request.extend(codec::encode(&reject_all()).unwrap());
    assert_eq!(roundtrip(&mut stream, &request).await, "1");
}

#[tokio::test]
async fn equivalence_with_the_target_itself_finds_nothing() {
    let addr = start(ends_in_one()).await;
    let mut stream = connect(addr).await;

    let mut request = b"eq ".to_vec();
    request.extend(codec::encode(&ends_in_one()).unwrap());
    assert_eq!(roundtrip(&mut stream, &request).await, "None");
}

#[tokio::test]
async fn malformed_input_gets_distinct_answers() {
    let addr = start(ends_in_one()).await;
    let mut stream = connect(addr).await;
    assert_eq!(roundtrip(&mut stream, b"hello oracle").await, "Not a query");
    assert_eq!(roundtrip(&mut stream, b"mq 12a").await, "Not a valid word");
    assert_eq!(
        roundtrip(&mut stream, b"eq {\"docType\":").await,
        "Not a valid automaton"
    );
    // the session survives every one of these
    assert_eq!(roundtrip(&mut stream, b"mq 1").await, "true");
}

#[tokio::test]
async fn an_abandoned_connection_does_not_disturb_others() {
    let addr = start(ends_in_one()).await;

    let abandoned = connect(addr).await;
    drop(abandoned);

    let mut stream = connect(addr).await;
    assert_eq!(roundtrip(&mut stream, b"mq 11").await, "true");
}
