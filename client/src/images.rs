use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Event, HtmlImageElement};

use muralboard_shared::ImageSource;

use crate::state::{LoadedImage, Session};

/// Routes an external image URL through the server-side proxy so the canvas
/// stays untainted and `toDataURL` keeps working.
pub fn proxied_url(url: &str) -> String {
    let encoded = js_sys::encode_uri_component(url);
    format!("/proxy-image?url={encoded}")
}

/// Starts an asynchronous image load and hands the decoded element to
/// `on_ready` once it arrives. Each call bumps the session's load
/// generation; a load that finishes after a newer one started is dropped
/// instead of stomping the newer image.
pub fn load_image<F>(
    session: &Rc<RefCell<Session>>,
    url: &str,
    source: ImageSource,
    on_ready: F,
) -> Result<(), JsValue>
where
    F: Fn(&Rc<RefCell<Session>>, &HtmlImageElement) + 'static,
{
    let generation = session.borrow_mut().begin_image_load();

    let image = HtmlImageElement::new()?;
    image.set_cross_origin(Some("anonymous"));

    {
        let session = session.clone();
        let image_cb = image.clone();
        let onload = Closure::<dyn FnMut(Event)>::new(move |_| {
            {
                let mut session_ref = session.borrow_mut();
                if session_ref.load_generation() != generation {
                    return;
                }
                session_ref.image = Some(LoadedImage {
                    width: f64::from(image_cb.natural_width()),
                    height: f64::from(image_cb.natural_height()),
                    source,
                });
            }
            on_ready(&session, &image_cb);
        });
        image.set_onload(Some(onload.as_ref().unchecked_ref()));
        onload.forget();
    }

    {
        let url = url.to_string();
        let onerror = Closure::<dyn FnMut(Event)>::new(move |_| {
            web_sys::console::error_1(&format!("Image load failed url={url}").into());
        });
        image.set_onerror(Some(onerror.as_ref().unchecked_ref()));
        onerror.forget();
    }

    image.set_src(url);
    Ok(())
}
