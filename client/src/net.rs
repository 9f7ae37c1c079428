use std::fmt;
use std::rc::Rc;

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Headers, Request, RequestInit, Response, WebSocket, Window};

use muralboard_shared::ClientMessage;

pub fn websocket_url(window: &Window) -> Result<String, JsValue> {
    let location = window.location();
    let protocol = location.protocol()?;
    let host = location.host()?;
    let scheme = if protocol == "https:" { "wss" } else { "ws" };
    Ok(format!("{scheme}://{host}/ws"))
}

/// Fire-and-forget send. Messages produced while the socket is anything but
/// OPEN are dropped; local painting never waits on connection state.
pub fn send_message(socket: &WebSocket, message: &ClientMessage) {
    if socket.ready_state() != WebSocket::OPEN {
        return;
    }
    match bincode::encode_to_vec(message, bincode::config::standard()) {
        Ok(bytes) => {
            let _ = socket.send_with_u8_array(&bytes);
        }
        Err(_) => {
            if let Ok(payload) = serde_json::to_string(message) {
                let _ = socket.send_with_str(&payload);
            }
        }
    }
}

/// Why an HTTP call produced no usable body. `Unreachable` means the fetch
/// itself failed (server down, network gone); `Http` means the server
/// answered but rejected the request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FetchError {
    Unreachable,
    Http(u16),
    Decode,
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::Unreachable => write!(f, "backend not reachable"),
            FetchError::Http(status) => write!(f, "processing error (status {status})"),
            FetchError::Decode => write!(f, "unreadable response"),
        }
    }
}

fn read_body<F>(response: Response, callback: Rc<F>)
where
    F: Fn(Result<String, FetchError>) + 'static,
{
    if !response.ok() {
        (*callback)(Err(FetchError::Http(response.status())));
        return;
    }
    let text_promise = match response.text() {
        Ok(promise) => promise,
        Err(_) => {
            (*callback)(Err(FetchError::Decode));
            return;
        }
    };
    let on_text = {
        let callback = callback.clone();
        Closure::<dyn FnMut(JsValue)>::new(move |value: JsValue| match value.as_string() {
            Some(text) => (*callback)(Ok(text)),
            None => (*callback)(Err(FetchError::Decode)),
        })
    };
    let on_text_err = Closure::<dyn FnMut(JsValue)>::new(move |_| {
        (*callback)(Err(FetchError::Decode));
    });
    let _ = text_promise.then2(&on_text, &on_text_err);
    on_text.forget();
    on_text_err.forget();
}

fn run_fetch<F>(promise: js_sys::Promise, callback: F)
where
    F: Fn(Result<String, FetchError>) + 'static,
{
    let callback = Rc::new(callback);
    let on_response = {
        let callback = callback.clone();
        Closure::<dyn FnMut(JsValue)>::new(move |value: JsValue| {
            match value.dyn_into::<Response>() {
                Ok(response) => read_body(response, callback.clone()),
                Err(_) => (*callback)(Err(FetchError::Unreachable)),
            }
        })
    };
    let on_network_err = Closure::<dyn FnMut(JsValue)>::new(move |_| {
        (*callback)(Err(FetchError::Unreachable));
    });
    let _ = promise.then2(&on_response, &on_network_err);
    on_response.forget();
    on_network_err.forget();
}

pub fn fetch_text<F>(window: &Window, url: &str, callback: F)
where
    F: Fn(Result<String, FetchError>) + 'static,
{
    run_fetch(window.fetch_with_str(url), callback);
}

pub fn post_json<F>(window: &Window, url: &str, body: &str, callback: F) -> Result<(), JsValue>
where
    F: Fn(Result<String, FetchError>) + 'static,
{
    let headers = Headers::new()?;
    headers.append("Content-Type", "application/json")?;
    let init = RequestInit::new();
    init.set_method("POST");
    init.set_headers(&headers);
    init.set_body(&JsValue::from_str(body));
    let request = Request::new_with_str_and_init(url, &init)?;
    run_fetch(window.fetch_with_request(&request), callback);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_error_messages_distinguish_network_from_server() {
        assert_eq!(FetchError::Unreachable.to_string(), "backend not reachable");
        assert_eq!(
            FetchError::Http(500).to_string(),
            "processing error (status 500)"
        );
    }
}
