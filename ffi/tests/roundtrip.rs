//! Drive the C surface the way a native host would: build a request through
//! the FFI, execute it with its own HTTP client (ureq here), then hand the
//! status and body back to `ib_check_response`.

use std::ffi::{CStr, CString};

use ib_foundation_ffi::types::{FfiErrorCode, FfiHttpResponse};
use ib_foundation_ffi::*;

fn start_server() -> std::net::SocketAddr {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener).await
        })
        .unwrap();
    });

    addr
}

/// Execute the request at `url` with the given headers, returning status and body.
fn execute(url: &str, headers: &[(String, String)]) -> (u16, String) {
    let agent = ureq::Agent::config_builder()
        .http_status_as_error(false)
        .build()
        .new_agent();
    let mut call = agent.get(url);
    for (k, v) in headers {
        call = call.header(k.as_str(), v.as_str());
    }
    let mut response = call.call().expect("HTTP transport error");
    let status = response.status().as_u16();
    let body = response.body_mut().read_to_string().unwrap_or_default();
    (status, body)
}

fn check(status: u16, body: &str) -> FfiErrorCode {
    let body = CString::new(body).unwrap();
    let resp = FfiHttpResponse {
        status,
        body: body.as_ptr(),
    };
    let result = ib_check_response(&resp);
    let code = unsafe { &*result }.error_code;
    ib_result_free(result);
    code
}

#[test]
fn host_round_trip() {
    let addr = start_server();
    let (scheme, host, base) = (
        CString::new("http").unwrap(),
        CString::new(addr.ip().to_string()).unwrap(),
        CString::new("v1").unwrap(),
    );

    // Step 1: a base builder for the service, branched per endpoint.
    let echo_path = CString::new("echo").unwrap();
    let base_builder = ib_builder_new(scheme.as_ptr(), host.as_ptr(), base.as_ptr(), echo_path.as_ptr());
    let echo = ib_builder_set_port(base_builder, addr.port());

    let (name, value, flag) = (
        CString::new("name").unwrap(),
        CString::new("value").unwrap(),
        CString::new("flag").unwrap(),
    );
    let with_name = ib_builder_add_query_item(echo, name.as_ptr(), value.as_ptr());
    let with_flag = ib_builder_add_query_item(with_name, flag.as_ptr(), std::ptr::null());
    let (field, trace) = (CString::new("X-Trace").unwrap(), CString::new("abc").unwrap());
    let endpoint = ib_builder_add_header(with_flag, field.as_ptr(), trace.as_ptr());

    // Step 2: finalize and read the request back out.
    let req = ib_builder_build(endpoint);
    assert!(!req.is_null());
    let req_ref = unsafe { &*req };
    let url = unsafe { CStr::from_ptr(req_ref.url) }.to_str().unwrap().to_string();
    let headers: Vec<(String, String)> = unsafe {
        std::slice::from_raw_parts(req_ref.headers, req_ref.headers_len as usize)
    }
    .iter()
    .map(|h| unsafe {
        (
            CStr::from_ptr(h.key).to_str().unwrap().to_string(),
            CStr::from_ptr(h.value).to_str().unwrap().to_string(),
        )
    })
    .collect();
    assert_eq!(url, format!("http://{addr}/v1/echo?name=value&flag"));

    // Step 3: execute it host-side and check the response.
    let (status, body) = execute(&url, &headers);
    assert_eq!(check(status, &body), FfiErrorCode::Ok);
    let echoed: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(echoed["query"], "name=value&flag");
    assert_eq!(echoed["headers"]["x-trace"], "abc");

    // Step 4: a failing endpoint surfaces as a bad server response.
    let missing_path = CString::new("status/404").unwrap();
    let missing = ib_builder_new(scheme.as_ptr(), host.as_ptr(), base.as_ptr(), missing_path.as_ptr());
    let missing_port = ib_builder_set_port(missing, addr.port());
    let missing_req = ib_builder_build(missing_port);
    let missing_url = unsafe { CStr::from_ptr((*missing_req).url) }.to_str().unwrap().to_string();
    let (status, body) = execute(&missing_url, &[]);
    assert_eq!(status, 404);
    assert_eq!(check(status, &body), FfiErrorCode::BadServerResponse);

    // Step 5: a 200 with a non-JSON body is a decode failure.
    let malformed_path = CString::new("malformed").unwrap();
    let malformed = ib_builder_new(scheme.as_ptr(), host.as_ptr(), base.as_ptr(), malformed_path.as_ptr());
    let malformed_port = ib_builder_set_port(malformed, addr.port());
    let malformed_req = ib_builder_build(malformed_port);
    let malformed_url = unsafe { CStr::from_ptr((*malformed_req).url) }.to_str().unwrap().to_string();
    let (status, body) = execute(&malformed_url, &[]);
    assert_eq!(check(status, &body), FfiErrorCode::Decode);

    for r in [req, missing_req, malformed_req] {
        ib_request_free(r);
    }
    for b in [
        endpoint, with_flag, with_name, echo, base_builder, missing, missing_port, malformed, malformed_port,
    ] {
        ib_builder_free(b);
    }
}
