//! One-shot loopback HTTP server for exercising the blocking clients.
use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use std::thread::JoinHandle;

/// What the client sent, with header names lowercased.
#[derive(Debug)]
pub struct RecordedRequest {
    pub line: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        let name = name.to_ascii_lowercase();
        self.headers
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Path and query of the request line.
    pub fn target(&self) -> &str {
        self.line.split(' ').nth(1).unwrap_or_default()
    }
}

/// Serves exactly one canned response, then hands back the request.
pub struct CannedServer {
    pub base_url: String,
    handle: JoinHandle<RecordedRequest>,
}

impl CannedServer {
    pub fn start(status: u16, headers: &[(&str, &str)], body: &str) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind loopback");
        let base_url = format!("http://{}", listener.local_addr().expect("local addr"));
        let mut response = format!(
            "HTTP/1.1 {status} {}\r\nContent-Type: application/json\r\n\
             Content-Length: {}\r\nConnection: close\r\n",
            reason_phrase(status),
            body.len()
        );
        for (name, value) in headers {
            response.push_str(&format!("{name}: {value}\r\n"));
        }
        response.push_str("\r\n");
        response.push_str(body);

        let handle = std::thread::spawn(move || {
            let (stream, _) = listener.accept().expect("accept connection");
            let mut reader = BufReader::new(stream.try_clone().expect("clone stream"));
            let request = read_request(&mut reader);
            let mut stream = stream;
            stream
                .write_all(response.as_bytes())
                .expect("write response");
            stream.flush().expect("flush response");
            request
        });
        Self { base_url, handle }
    }

    pub fn request(self) -> RecordedRequest {
        self.handle.join().expect("server thread")
    }
}

fn read_request(reader: &mut impl BufRead) -> RecordedRequest {
    let mut line = String::new();
    reader.read_line(&mut line).expect("read request line");
    let mut headers = Vec::new();
    loop {
        let mut raw = String::new();
        reader.read_line(&mut raw).expect("read header");
        let raw = raw.trim_end();
        if raw.is_empty() {
            break;
        }
        if let Some((name, value)) = raw.split_once(':') {
            headers.push((name.trim().to_ascii_lowercase(), value.trim().to_string()));
        }
    }
    let mut request = RecordedRequest {
        line: line.trim_end().to_string(),
        headers,
        body: String::new(),
    };
    if let Some(length) = request.header("content-length") {
        let length: usize = length.parse().expect("numeric content-length");
        let mut body = vec![0; length];
        reader.read_exact(&mut body).expect("read body");
        request.body = String::from_utf8(body).expect("utf-8 body");
    } else if request
        .header("transfer-encoding")
        .is_some_and(|value| value.eq_ignore_ascii_case("chunked"))
    {
        request.body = read_chunked(reader);
    }
    request
}

fn read_chunked(reader: &mut impl BufRead) -> String {
    let mut body = Vec::new();
    loop {
        let mut size_line = String::new();
        reader.read_line(&mut size_line).expect("read chunk size");
        let size_text = size_line.trim().split(';').next().unwrap_or_default();
        let size = usize::from_str_radix(size_text, 16).expect("hex chunk size");
        let mut chunk = vec![0; size + 2];
        reader.read_exact(&mut chunk).expect("read chunk");
        if size == 0 {
            break;
        }
        body.extend_from_slice(&chunk[..size]);
    }
    String::from_utf8(body).expect("utf-8 body")
}

fn reason_phrase(status: u16) -> &'static str {
    match status {
        200 => "OK",
        201 => "Created",
        404 => "Not Found",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "Status",
    }
}
