#![allow(dead_code)]

use std::io::{BufRead, BufReader, ErrorKind, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use logscope::{
    log::{LogRecord, LogSource},
    ui::App,
    worker::{WorkerHandle, WorkerMessage},
};
use ratatui::{backend::TestBackend, Terminal};
use tempfile::NamedTempFile;

/// Helper to create a record with a fixed timestamp
pub fn create_test_record(message: &str) -> LogRecord {
    create_test_record_at("2024-12-10T12:00:00.000Z", message)
}

pub fn create_test_record_at(time: &str, message: &str) -> LogRecord {
    LogRecord::new(time, format!("{{\"message\":\"{}\"}}", message))
}

/// Helper to create an App that already holds `n` records
pub fn create_app_with_records(n: usize, viewport_height: u16) -> App {
    let mut app = App::default();
    app.set_viewport_height(viewport_height);
    app.append_batch(
        (0..n)
            .map(|i| create_test_record(&format!("Log line number {}", i + 1)))
            .collect(),
    );
    app
}

/// `n` NDJSON lines with increasing `_time`, newline terminated
pub fn ndjson_lines(n: usize) -> String {
    let mut body = String::new();
    for i in 0..n {
        body.push_str(&format!(
            "{{\"_time\":{},\"message\":\"line {}\"}}\n",
            1_724_323_576_596u64 + i as u64,
            i
        ));
    }
    body
}

/// Helper to write `content` to a temporary file
pub fn write_temp_log(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

pub fn file_source(file: &NamedTempFile) -> LogSource {
    LogSource::File(file.path().to_path_buf())
}

/// Read the request head before answering
fn read_request_head(stream: &TcpStream) {
    let mut reader = BufReader::new(stream.try_clone().unwrap());
    let mut line = String::new();
    while reader.read_line(&mut line).unwrap_or(0) > 0 {
        if line == "\r\n" {
            break;
        }
        line.clear();
    }
}

/// Serve one HTTP response on a loopback port and return the URL to request
pub fn serve_once(status: &str, body: &str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let address = listener.local_addr().unwrap();
    let status = status.to_string();
    let body = body.to_string();

    thread::spawn(move || {
        if let Ok((mut stream, _)) = listener.accept() {
            read_request_head(&stream);
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/x-ndjson\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            let _ = stream.write_all(response.as_bytes());
            let _ = stream.flush();
        }
    });

    format!("http://{}/logs.ndjson", address)
}

/// Announce `missing` more body bytes than are sent, then hang up mid-body
pub fn serve_truncated(body: &str, missing: usize) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let address = listener.local_addr().unwrap();
    let body = body.to_string();

    thread::spawn(move || {
        if let Ok((mut stream, _)) = listener.accept() {
            read_request_head(&stream);
            let head = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: application/x-ndjson\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                body.len() + missing
            );
            let _ = stream.write_all(head.as_bytes());
            let _ = stream.write_all(body.as_bytes());
            let _ = stream.flush();
            let _ = stream.shutdown(std::net::Shutdown::Both);
        }
    });

    format!("http://{}/logs.ndjson", address)
}

/// Send `body` and then keep the response open without sending more.
///
/// The receiver gets a message once the client closes its end.
pub fn serve_stalled(body: &str) -> (String, mpsc::Receiver<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let address = listener.local_addr().unwrap();
    let body = body.to_string();
    let (closed_tx, closed_rx) = mpsc::channel();

    thread::spawn(move || {
        if let Ok((mut stream, _)) = listener.accept() {
            read_request_head(&stream);
            // No length: the body runs until the connection closes
            let head = "HTTP/1.1 200 OK\r\nContent-Type: application/x-ndjson\r\nConnection: close\r\n\r\n";
            let _ = stream.write_all(head.as_bytes());
            let _ = stream.write_all(body.as_bytes());
            let _ = stream.flush();

            stream.set_read_timeout(Some(Duration::from_secs(30))).unwrap();
            let mut buf = [0u8; 64];
            loop {
                match stream.read(&mut buf) {
                    Ok(0) => break,
                    Ok(_) => continue,
                    Err(err) if matches!(err.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                        return;
                    }
                    Err(_) => break,
                }
            }
            let _ = closed_tx.send(());
        }
    });

    (format!("http://{}/logs.ndjson", address), closed_rx)
}

/// Collect worker messages until the stream reports its end or failure
pub async fn collect_messages(worker: &mut WorkerHandle) -> Vec<WorkerMessage> {
    let mut messages = Vec::new();
    while let Some(message) = worker.recv().await {
        let done = !matches!(message, WorkerMessage::Batch(_));
        messages.push(message);
        if done {
            break;
        }
    }
    messages
}

/// All records carried by `Batch` messages, in order
pub fn batched_records(messages: &[WorkerMessage]) -> Vec<LogRecord> {
    messages
        .iter()
        .flat_map(|message| match message {
            WorkerMessage::Batch(batch) => batch.clone(),
            _ => Vec::new(),
        })
        .collect()
}

/// Helper to render the app to a test terminal and return the buffer as a string
pub fn render_app_to_string(app: &mut App, width: u16, height: u16) -> String {
    let backend = TestBackend::new(width, height);
    let mut terminal = Terminal::new(backend).unwrap();

    terminal
        .draw(|f| {
            logscope::ui::draw(f, app);
        })
        .unwrap();

    let buffer = terminal.backend().buffer();
    let mut result = String::new();
    for y in 0..height {
        for x in 0..width {
            let cell = buffer.cell((x, y)).unwrap();
            result.push_str(cell.symbol());
        }
        result.push('\n');
    }
    result
}
