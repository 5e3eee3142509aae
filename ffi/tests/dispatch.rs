//! Resolve through the C ABI and send the request to the live mock server,
//! the way a C host would: read the `repr(C)` request and hand its fields to
//! an HTTP client.

use std::ffi::{CStr, CString};
use std::os::raw::c_char;

use collection_ffi::types::{FfiErrorCode, FfiHttpMethod};
use collection_ffi::*;

const COLLECTION: &str = include_str!("../../collections/payments.postman_collection.json");

fn read(ptr: *const c_char) -> String {
    unsafe { CStr::from_ptr(ptr) }.to_str().unwrap().to_string()
}

fn start_mock_server() -> std::net::SocketAddr {
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

#[test]
fn create_through_the_c_abi() {
    let addr = start_mock_server();

    let json = CString::new(COLLECTION).unwrap();
    let store = pmt_store_new(json.as_ptr());
    let env = pmt_env_new();
    for (k, v) in [
        ("baseUrl", format!("http://{addr}")),
        ("api_key", "snd_ffi".to_string()),
        ("customer_id", "cus_ffi".to_string()),
    ] {
        let k = CString::new(k).unwrap();
        let v = CString::new(v).unwrap();
        assert!(pmt_env_set(env, k.as_ptr(), v.as_ptr()));
    }

    let name = CString::new("Payments - Create").unwrap();
    let result = pmt_resolve(store, name.as_ptr(), env);
    let r = unsafe { &*result };
    assert_eq!(r.error_code, FfiErrorCode::Ok);
    let req = unsafe { &*r.request };
    assert_eq!(req.method, FfiHttpMethod::Post);

    let agent = ureq::Agent::config_builder()
        .http_status_as_error(false)
        .build()
        .new_agent();
    let mut builder = agent.post(&read(req.url));
    let headers = unsafe { std::slice::from_raw_parts(req.headers, req.headers_len as usize) };
    for h in headers {
        builder = builder.header(read(h.key), read(h.value));
    }
    let mut response = builder
        .send(read(req.body).as_bytes())
        .expect("HTTP transport error");

    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value =
        serde_json::from_str(&response.body_mut().read_to_string().unwrap()).unwrap();
    assert_eq!(body["amount"], 6540);
    assert_eq!(body["customer_id"], "cus_ffi");

    pmt_free_result(result);
    pmt_env_free(env);
    pmt_store_free(store);
}
