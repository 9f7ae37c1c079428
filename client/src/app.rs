use std::cell::{Cell, RefCell};
use std::rc::Rc;

use js_sys::{Reflect, Uint8Array};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{
    CloseEvent, Document, Element, Event, HtmlButtonElement, HtmlCanvasElement, HtmlElement,
    HtmlImageElement, HtmlInputElement, HtmlSpanElement, HtmlTextAreaElement, MessageEvent,
    PointerEvent, WebSocket, Window,
};

use muralboard_shared::{
    ClientMessage, ImageSource, ServerMessage, StrokeSegment, Submission, Tool, VoteDirection,
};

use crate::brush;
use crate::canvas;
use crate::coords;
use crate::cursor;
use crate::dom::{
    get_element, set_button_busy, set_error_panel, set_status, set_tool_button, update_size_label,
};
use crate::images;
use crate::net::{self, FetchError};
use crate::state::Session;

const EDITOR_CONTAINER_ID: &str = "editor";

type SharedSession = Rc<RefCell<Session>>;
type QueuedSegment = (f64, f64, f64, f64);

fn document_ready_state(document: &Document) -> Option<String> {
    Reflect::get(document.as_ref(), &JsValue::from_str("readyState"))
        .ok()?
        .as_string()
}

fn make_id() -> String {
    let now = js_sys::Date::now() as u64;
    let rand = (js_sys::Math::random() * (u32::MAX as f64 + 1.0)) as u32;
    format!("{now:x}-{rand:08x}")
}

fn now_iso() -> String {
    String::from(js_sys::Date::new_0().to_iso_string())
}

/// External URLs go through the proxy so the canvas stays exportable;
/// data URLs are already same-origin.
fn displayable_url(image_url: &str) -> String {
    if image_url.starts_with("data:") {
        image_url.to_string()
    } else {
        images::proxied_url(image_url)
    }
}

#[wasm_bindgen(start)]
pub fn run() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();

    let window = web_sys::window().ok_or_else(|| JsValue::from_str("Missing window"))?;
    let document = window
        .document()
        .ok_or_else(|| JsValue::from_str("Missing document"))?;
    let started = Rc::new(Cell::new(false));

    if document_ready_state(&document).as_deref() == Some("complete") {
        started.set(true);
        return start_app();
    }

    let onload_started = started.clone();
    let onload = Closure::<dyn FnMut(Event)>::new(move |_| {
        if onload_started.replace(true) {
            return;
        }
        if let Err(err) = start_app() {
            web_sys::console::error_1(&err);
        }
    });
    window.add_event_listener_with_callback("load", onload.as_ref().unchecked_ref())?;
    onload.forget();

    Ok(())
}

fn attach_pointer_handlers(
    session: &SharedSession,
    socket: &Rc<WebSocket>,
    canvas: &HtmlCanvasElement,
    pending: &Rc<RefCell<Vec<QueuedSegment>>>,
    schedule_flush: &Rc<dyn Fn()>,
) -> Result<(), JsValue> {
    {
        let session = session.clone();
        let socket = socket.clone();
        let canvas_cb = canvas.clone();
        let pending = pending.clone();
        let schedule_flush = schedule_flush.clone();
        let ondown = Closure::<dyn FnMut(PointerEvent)>::new(move |event: PointerEvent| {
            if event.button() != 0 {
                return;
            }
            event.prevent_default();
            let (x, y) = coords::pointer_to_canvas(&event, &canvas_cb);
            {
                let mut session_ref = session.borrow_mut();
                let Some(width) = session_ref.current_brush_width() else {
                    return;
                };
                let tool = session_ref.tool;
                let color = session_ref.user_color.clone();
                if let Some(stack) = session_ref.stack.as_ref() {
                    brush::paint_dot(&stack.mask_ctx, x, y, width, tool, &color);
                }
                session_ref.is_drawing = true;
                session_ref.last_x = x;
                session_ref.last_y = y;
            }
            let _ = canvas_cb.set_pointer_capture(event.pointer_id());
            net::send_message(&socket, &ClientMessage::StartDrawing);
            pending.borrow_mut().push((x, y, x, y));
            schedule_flush();
        });
        canvas.add_event_listener_with_callback("pointerdown", ondown.as_ref().unchecked_ref())?;
        ondown.forget();
    }

    {
        let session = session.clone();
        let canvas_cb = canvas.clone();
        let pending = pending.clone();
        let schedule_flush = schedule_flush.clone();
        let onmove = Closure::<dyn FnMut(PointerEvent)>::new(move |event: PointerEvent| {
            let (x, y) = coords::pointer_to_canvas(&event, &canvas_cb);
            let mut session_ref = session.borrow_mut();
            if let Some(width) = session_ref.current_brush_width() {
                if let Some(stack) = session_ref.stack.as_ref() {
                    cursor::update_cursor(stack, x, y, width, &session_ref.user_color);
                }
            }
            if !session_ref.is_drawing {
                return;
            }
            let from = (session_ref.last_x, session_ref.last_y);
            session_ref.last_x = x;
            session_ref.last_y = y;
            drop(session_ref);
            pending.borrow_mut().push((from.0, from.1, x, y));
            schedule_flush();
        });
        canvas.add_event_listener_with_callback("pointermove", onmove.as_ref().unchecked_ref())?;
        onmove.forget();
    }

    for kind in ["pointerup", "pointercancel"] {
        let session = session.clone();
        let socket = socket.clone();
        let onup = Closure::<dyn FnMut(PointerEvent)>::new(move |_| {
            let mut session_ref = session.borrow_mut();
            if !session_ref.is_drawing {
                return;
            }
            session_ref.is_drawing = false;
            drop(session_ref);
            net::send_message(&socket, &ClientMessage::StopDrawing);
        });
        canvas.add_event_listener_with_callback(kind, onup.as_ref().unchecked_ref())?;
        onup.forget();
    }

    {
        let session = session.clone();
        let canvas_cb = canvas.clone();
        let onenter = Closure::<dyn FnMut(PointerEvent)>::new(move |event: PointerEvent| {
            let (x, y) = coords::pointer_to_canvas(&event, &canvas_cb);
            let session_ref = session.borrow();
            if let Some(width) = session_ref.current_brush_width() {
                if let Some(stack) = session_ref.stack.as_ref() {
                    cursor::update_cursor(stack, x, y, width, &session_ref.user_color);
                }
            }
        });
        canvas
            .add_event_listener_with_callback("pointerenter", onenter.as_ref().unchecked_ref())?;
        onenter.forget();
    }

    {
        let session = session.clone();
        let socket = socket.clone();
        let onleave = Closure::<dyn FnMut(PointerEvent)>::new(move |_| {
            let mut session_ref = session.borrow_mut();
            if let Some(stack) = session_ref.stack.as_ref() {
                cursor::clear_cursor(stack);
            }
            if !session_ref.is_drawing {
                return;
            }
            session_ref.is_drawing = false;
            drop(session_ref);
            net::send_message(&socket, &ClientMessage::StopDrawing);
        });
        canvas
            .add_event_listener_with_callback("pointerleave", onleave.as_ref().unchecked_ref())?;
        onleave.forget();
    }

    Ok(())
}

fn render_submissions(document: &Document, session: &Session, container: &HtmlElement) {
    container.set_inner_html("");
    let user_id = session.vote_user_id();
    for submission in &session.submissions {
        let Ok(card) = document.create_element("div") else {
            continue;
        };
        card.set_class_name("submission-card");
        let _ = card.set_attribute("data-id", &submission.id);

        if let Ok(img) = document.create_element("img") {
            let _ = img.set_attribute("src", &displayable_url(&submission.image_url));
            let _ = img.set_attribute("alt", &submission.prompt);
            let _ = card.append_child(&img);
        }
        if let Ok(caption) = document.create_element("p") {
            caption.set_text_content(Some(&submission.prompt));
            let _ = card.append_child(&caption);
        }

        let tally = session.votes.tally(&submission.id, user_id);
        for (direction, label, count) in [
            ("up", "▲", tally.upvotes),
            ("down", "▼", tally.downvotes),
        ] {
            let Ok(button) = document.create_element("button") else {
                continue;
            };
            let _ = button.set_attribute("data-vote", direction);
            let _ = button.set_attribute("data-id", &submission.id);
            let active = matches!(
                (tally.user_vote, direction),
                (Some(VoteDirection::Up), "up") | (Some(VoteDirection::Down), "down")
            );
            button.set_class_name(if active { "vote active" } else { "vote" });
            button.set_text_content(Some(&format!("{label} {count}")));
            let _ = card.append_child(&button);
        }

        let _ = container.append_child(&card);
    }
}

fn push_votes_to_server(window: &Window, session: &Session) {
    let Some(json) = session.votes.to_json() else {
        return;
    };
    let result = net::post_json(window, "/api/save-votes", &json, |result| {
        if let Err(error) = result {
            web_sys::console::warn_1(&format!("Vote sync failed: {error}").into());
        }
    });
    if result.is_err() {
        web_sys::console::warn_1(&"Vote sync request could not be built".into());
    }
}

fn start_app() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();

    let window = web_sys::window().ok_or_else(|| JsValue::from_str("Missing window"))?;
    let document = window
        .document()
        .ok_or_else(|| JsValue::from_str("Missing document"))?;

    let size_input: HtmlInputElement = get_element(&document, "brushSize")?;
    let size_value: HtmlSpanElement = get_element(&document, "brushSizeValue")?;
    let brush_button: HtmlButtonElement = get_element(&document, "brushTool")?;
    let eraser_button: HtmlButtonElement = get_element(&document, "eraserTool")?;
    let clear_button: HtmlButtonElement = get_element(&document, "clearMask")?;
    let generate_button: HtmlButtonElement = get_element(&document, "generateBtn")?;
    let submit_button: HtmlButtonElement = get_element(&document, "submitBtn")?;
    let prompt_input: HtmlTextAreaElement = get_element(&document, "prompt")?;
    let negative_input: HtmlTextAreaElement = get_element(&document, "negativePrompt")?;
    let error_panel: HtmlElement = get_element(&document, "generationError")?;
    let preview_image: HtmlImageElement = get_element(&document, "previewImage")?;
    let submissions_el: HtmlElement = get_element(&document, "submissionsList")?;
    let status_el = document
        .get_element_by_id("status")
        .ok_or_else(|| JsValue::from_str("Missing status element"))?;
    let status_text = document
        .get_element_by_id("statusText")
        .ok_or_else(|| JsValue::from_str("Missing status text"))?;

    let session: SharedSession = Rc::new(RefCell::new(Session::new()));
    let current_image: Rc<RefCell<Option<HtmlImageElement>>> = Rc::new(RefCell::new(None));
    let last_generated: Rc<RefCell<Option<(String, String)>>> = Rc::new(RefCell::new(None));
    let last_location: Rc<RefCell<Option<(f64, f64)>>> = Rc::new(RefCell::new(None));

    update_size_label(&size_input, &size_value);
    set_status(&status_el, &status_text, "connecting", "Connecting...");
    set_tool_button(&brush_button, true);
    set_tool_button(&eraser_button, false);
    set_error_panel(&error_panel, None);
    set_button_busy(&submit_button, true);

    // Local votes first, then the server copy merged over them.
    if let Ok(Some(storage)) = window.local_storage() {
        session.borrow_mut().votes.load_local(&storage);
    }
    {
        let session = session.clone();
        let window_cb = window.clone();
        let document_cb = document.clone();
        let submissions_cb = submissions_el.clone();
        net::fetch_text(&window, "/api/vote-data", move |result| match result {
            Ok(body) => {
                let mut session_ref = session.borrow_mut();
                if !session_ref.votes.adopt_json(&body) {
                    web_sys::console::warn_1(&"Unreadable vote data from server".into());
                    return;
                }
                if let Ok(Some(storage)) = window_cb.local_storage() {
                    session_ref.votes.save_local(&storage);
                }
                render_submissions(&document_cb, &session_ref, &submissions_cb);
            }
            Err(error) => {
                web_sys::console::warn_1(&format!("Vote fetch failed: {error}").into());
            }
        });
    }

    let ws_url = net::websocket_url(&window)?;
    web_sys::console::log_1(&format!("WS connecting url={ws_url}").into());
    let socket = Rc::new(WebSocket::new(&ws_url)?);
    let _ = Reflect::set(
        socket.as_ref(),
        &JsValue::from_str("binaryType"),
        &JsValue::from_str("arraybuffer"),
    );

    {
        let status_el = status_el.clone();
        let status_text = status_text.clone();
        let socket_cb = socket.clone();
        let onopen = Closure::<dyn FnMut(Event)>::new(move |_| {
            set_status(&status_el, &status_text, "open", "Live connection");
            net::send_message(&socket_cb, &ClientMessage::GetSubmissions);
        });
        socket.set_onopen(Some(onopen.as_ref().unchecked_ref()));
        onopen.forget();
    }

    {
        let status_el = status_el.clone();
        let status_text = status_text.clone();
        let onclose = Closure::<dyn FnMut(CloseEvent)>::new(move |event: CloseEvent| {
            web_sys::console::warn_1(
                &format!(
                    "WS close code={} was_clean={} reason={:?}",
                    event.code(),
                    event.was_clean(),
                    event.reason()
                )
                .into(),
            );
            set_status(&status_el, &status_text, "closed", "Offline");
        });
        socket.set_onclose(Some(onclose.as_ref().unchecked_ref()));
        onclose.forget();
    }

    {
        let status_el = status_el.clone();
        let status_text = status_text.clone();
        let onerror = Closure::<dyn FnMut(Event)>::new(move |_| {
            set_status(&status_el, &status_text, "closed", "Connection error");
        });
        socket.set_onerror(Some(onerror.as_ref().unchecked_ref()));
        onerror.forget();
    }

    let pending: Rc<RefCell<Vec<QueuedSegment>>> = Rc::new(RefCell::new(Vec::new()));
    let flush_scheduled = Rc::new(Cell::new(false));
    let schedule_flush: Rc<dyn Fn()> = Rc::new({
        let session = session.clone();
        let socket = socket.clone();
        let window = window.clone();
        let pending = pending.clone();
        let flush_scheduled = flush_scheduled.clone();
        move || {
            if flush_scheduled.replace(true) {
                return;
            }
            let session = session.clone();
            let socket = socket.clone();
            let pending = pending.clone();
            let flush_scheduled = flush_scheduled.clone();
            let cb = Closure::once_into_js(move |_: f64| {
                flush_scheduled.set(false);
                let queued = std::mem::take(&mut *pending.borrow_mut());
                if queued.is_empty() {
                    return;
                }
                let session_ref = session.borrow();
                let Some(width) = session_ref.current_brush_width() else {
                    return;
                };
                let tool = session_ref.tool;
                let color = session_ref.user_color.clone();
                let from_modal = session_ref
                    .image
                    .map(|image| image.source.is_modal())
                    .unwrap_or(false);
                let Some(stack) = session_ref.stack.as_ref() else {
                    return;
                };
                for (from_x, from_y, to_x, to_y) in queued {
                    brush::paint_segment(
                        &stack.mask_ctx,
                        (from_x, from_y),
                        (to_x, to_y),
                        width,
                        tool,
                        &color,
                    );
                    net::send_message(
                        &socket,
                        &ClientMessage::BrushStroke {
                            segment: StrokeSegment {
                                from_x,
                                from_y,
                                to_x,
                                to_y,
                                brush_width: width,
                                tool,
                                canvas_width: stack.width,
                                canvas_height: stack.height,
                                from_modal,
                            },
                        },
                    );
                }
            });
            let _ = window.request_animation_frame(cb.unchecked_ref());
        }
    });

    // Mounting replaces all three canvases, so pointer listeners must be
    // re-attached to the new mask surface on every image load.
    let remount: Rc<dyn Fn(&SharedSession, &HtmlImageElement)> = Rc::new({
        let document = document.clone();
        let socket = socket.clone();
        let pending = pending.clone();
        let schedule_flush = schedule_flush.clone();
        move |session: &SharedSession, image: &HtmlImageElement| {
            match canvas::mount_image(&document, EDITOR_CONTAINER_ID, image) {
                Ok(stack) => {
                    let mask = stack.mask.clone();
                    session.borrow_mut().stack = Some(stack);
                    if let Err(err) =
                        attach_pointer_handlers(session, &socket, &mask, &pending, &schedule_flush)
                    {
                        web_sys::console::error_1(&err);
                    }
                }
                Err(err) => web_sys::console::error_1(&err),
            }
        }
    });

    let start_image_load: Rc<dyn Fn(&str, ImageSource)> = Rc::new({
        let session = session.clone();
        let current_image = current_image.clone();
        let remount = remount.clone();
        move |url: &str, source: ImageSource| {
            let on_ready = {
                let current_image = current_image.clone();
                let remount = remount.clone();
                move |session: &SharedSession, image: &HtmlImageElement| {
                    *current_image.borrow_mut() = Some(image.clone());
                    remount(session, image);
                }
            };
            if let Err(err) = images::load_image(&session, url, source, on_ready) {
                web_sys::console::error_1(&err);
            }
        }
    });

    {
        let session = session.clone();
        let document_cb = document.clone();
        let start_image_load = start_image_load.clone();
        let last_generated = last_generated.clone();
        let last_location = last_location.clone();
        let size_input_cb = size_input.clone();
        let size_value_cb = size_value.clone();
        let prompt_cb = prompt_input.clone();
        let negative_cb = negative_input.clone();
        let preview_cb = preview_image.clone();
        let submit_cb = submit_button.clone();
        let submissions_cb = submissions_el.clone();
        let onmessage = Closure::<dyn FnMut(MessageEvent)>::new(move |event: MessageEvent| {
            let message = if let Ok(buffer) = event.data().dyn_into::<js_sys::ArrayBuffer>() {
                let bytes = Uint8Array::new(&buffer).to_vec();
                match bincode::decode_from_slice::<ServerMessage, _>(
                    &bytes,
                    bincode::config::standard(),
                ) {
                    Ok((message, _)) => message,
                    Err(error) => {
                        web_sys::console::error_1(
                            &format!("WS message bincode parse error: {error}").into(),
                        );
                        return;
                    }
                }
            } else if let Some(text) = event.data().as_string() {
                match serde_json::from_str::<ServerMessage>(&text) {
                    Ok(message) => message,
                    Err(error) => {
                        web_sys::console::error_1(
                            &format!("WS message JSON parse error: {error}").into(),
                        );
                        return;
                    }
                }
            } else {
                web_sys::console::error_2(
                    &"WS message data is not a string or arraybuffer".into(),
                    &event.data(),
                );
                return;
            };

            match message {
                ServerMessage::Welcome { user, users } => {
                    let mut session_ref = session.borrow_mut();
                    crate::replicate::handle_welcome(&mut session_ref, &user, &users);
                    size_input_cb.set_value(&session_ref.brush_size.to_string());
                    update_size_label(&size_input_cb, &size_value_cb);
                }
                ServerMessage::UserConnected { user } => {
                    crate::replicate::handle_user_connected(&mut session.borrow_mut(), &user);
                }
                ServerMessage::UsersList { users } => {
                    crate::replicate::handle_users_list(&mut session.borrow_mut(), &users);
                }
                ServerMessage::BrushStroke {
                    user_id,
                    color,
                    segment,
                } => {
                    crate::replicate::handle_brush_stroke(
                        &mut session.borrow_mut(),
                        &document_cb,
                        &user_id,
                        &color,
                        &segment,
                    );
                }
                ServerMessage::UserDrawing {
                    user_id,
                    color,
                    is_drawing,
                } => {
                    crate::replicate::handle_user_drawing(
                        &mut session.borrow_mut(),
                        &document_cb,
                        &user_id,
                        &color,
                        is_drawing,
                    );
                }
                ServerMessage::MaskCleared { .. } => {
                    crate::replicate::handle_mask_cleared(&session.borrow());
                }
                ServerMessage::BrushSizeUpdated { user_id, size } => {
                    crate::replicate::handle_brush_size(&mut session.borrow_mut(), &user_id, size);
                }
                ServerMessage::ImageUploaded { image_url, .. } => {
                    start_image_load(&displayable_url(&image_url), ImageSource::PeerUpload);
                }
                ServerMessage::ImageGenerated {
                    user_id,
                    image_url,
                    prompt,
                    negative_prompt,
                } => {
                    let url = displayable_url(&image_url);
                    preview_cb.set_src(&url);
                    set_button_busy(&submit_cb, false);
                    *last_generated.borrow_mut() = Some((image_url.clone(), prompt.clone()));
                    let is_self = session.borrow().user_id.as_deref() == Some(user_id.as_str());
                    if is_self {
                        prompt_cb.set_value(&prompt);
                        negative_cb.set_value(&negative_prompt);
                    }
                    start_image_load(&url, ImageSource::PeerGenerated);
                }
                ServerMessage::LocationUpdated {
                    lat,
                    lng,
                    image_url,
                    ..
                } => {
                    *last_location.borrow_mut() = Some((lat, lng));
                    if let Some(image_url) = image_url {
                        start_image_load(&displayable_url(&image_url), ImageSource::StreetView);
                    }
                }
                ServerMessage::SubmissionsList { submissions } => {
                    let mut session_ref = session.borrow_mut();
                    session_ref.submissions = submissions;
                    render_submissions(&document_cb, &session_ref, &submissions_cb);
                }
                ServerMessage::SubmissionCreated { submission } => {
                    let mut session_ref = session.borrow_mut();
                    session_ref.submissions.push(submission);
                    render_submissions(&document_cb, &session_ref, &submissions_cb);
                }
            }
        });
        socket.set_onmessage(Some(onmessage.as_ref().unchecked_ref()));
        onmessage.forget();
    }

    {
        let session = session.clone();
        let socket = socket.clone();
        let size_input_cb = size_input.clone();
        let size_value_cb = size_value.clone();
        let oninput = Closure::<dyn FnMut(Event)>::new(move |_| {
            let size = size_input_cb.value().parse::<u8>().unwrap_or(5);
            let mut session_ref = session.borrow_mut();
            session_ref.set_brush_size(size);
            update_size_label(&size_input_cb, &size_value_cb);
            if let Some(width) = session_ref.current_brush_width() {
                if let Some(stack) = session_ref.stack.as_ref() {
                    cursor::preview_at_center(
                        stack,
                        width,
                        &session_ref.user_color,
                        session_ref.brush_size,
                    );
                }
            }
            let size = session_ref.brush_size;
            drop(session_ref);
            net::send_message(&socket, &ClientMessage::UpdateBrushSize { size });
        });
        size_input.add_event_listener_with_callback("input", oninput.as_ref().unchecked_ref())?;
        oninput.forget();
    }

    {
        let session = session.clone();
        let brush_button_cb = brush_button.clone();
        let eraser_button_cb = eraser_button.clone();
        let onclick = Closure::<dyn FnMut(Event)>::new(move |_| {
            session.borrow_mut().tool = Tool::Brush;
            set_tool_button(&brush_button_cb, true);
            set_tool_button(&eraser_button_cb, false);
        });
        brush_button.add_event_listener_with_callback("click", onclick.as_ref().unchecked_ref())?;
        onclick.forget();
    }

    {
        let session = session.clone();
        let brush_button_cb = brush_button.clone();
        let eraser_button_cb = eraser_button.clone();
        let onclick = Closure::<dyn FnMut(Event)>::new(move |_| {
            session.borrow_mut().tool = Tool::Eraser;
            set_tool_button(&brush_button_cb, false);
            set_tool_button(&eraser_button_cb, true);
        });
        eraser_button
            .add_event_listener_with_callback("click", onclick.as_ref().unchecked_ref())?;
        onclick.forget();
    }

    {
        let session = session.clone();
        let socket = socket.clone();
        let onclick = Closure::<dyn FnMut(Event)>::new(move |_| {
            if let Some(stack) = session.borrow().stack.as_ref() {
                stack.clear_mask();
            }
            net::send_message(&socket, &ClientMessage::ClearMask);
        });
        clear_button.add_event_listener_with_callback("click", onclick.as_ref().unchecked_ref())?;
        onclick.forget();
    }

    {
        let session = session.clone();
        let socket = socket.clone();
        let window_cb = window.clone();
        let generate_button_cb = generate_button.clone();
        let prompt_cb = prompt_input.clone();
        let negative_cb = negative_input.clone();
        let error_panel_cb = error_panel.clone();
        let onclick = Closure::<dyn FnMut(Event)>::new(move |_| {
            let (base_data, mask_data) = {
                let session_ref = session.borrow();
                let Some(stack) = session_ref.stack.as_ref() else {
                    set_error_panel(&error_panel_cb, Some("Load an image before generating"));
                    return;
                };
                let base = stack.base.to_data_url().unwrap_or_default();
                let mask = stack.mask.to_data_url().unwrap_or_default();
                (base, mask)
            };
            let prompt = prompt_cb.value();
            let negative = negative_cb.value();
            let body = serde_json::json!({
                "image": base_data,
                "mask": mask_data,
                "prompt": prompt,
                "negative_prompt": negative,
            })
            .to_string();

            set_error_panel(&error_panel_cb, None);
            set_button_busy(&generate_button_cb, true);

            let socket = socket.clone();
            let generate_button_done = generate_button_cb.clone();
            let error_panel_done = error_panel_cb.clone();
            let result = net::post_json(&window_cb, "/api/process", &body, move |result| {
                set_button_busy(&generate_button_done, false);
                match result {
                    Ok(response) => {
                        let image_url = serde_json::from_str::<serde_json::Value>(&response)
                            .ok()
                            .and_then(|value| {
                                value.get("image_url").and_then(|url| {
                                    url.as_str().map(|url| url.to_string())
                                })
                            });
                        let Some(image_url) = image_url else {
                            set_error_panel(
                                &error_panel_done,
                                Some("Generation failed: unreadable response"),
                            );
                            return;
                        };
                        net::send_message(
                            &socket,
                            &ClientMessage::ImageGenerated {
                                image_url,
                                prompt: prompt.clone(),
                                negative_prompt: negative.clone(),
                            },
                        );
                    }
                    Err(FetchError::Unreachable) => {
                        set_error_panel(
                            &error_panel_done,
                            Some("Generation failed: backend not reachable"),
                        );
                    }
                    Err(error) => {
                        set_error_panel(
                            &error_panel_done,
                            Some(&format!("Generation failed: {error}")),
                        );
                    }
                }
            });
            if result.is_err() {
                set_button_busy(&generate_button_cb, false);
                set_error_panel(&error_panel_cb, Some("Generation request could not be built"));
            }
        });
        generate_button
            .add_event_listener_with_callback("click", onclick.as_ref().unchecked_ref())?;
        onclick.forget();
    }

    {
        let session = session.clone();
        let socket = socket.clone();
        let document_cb = document.clone();
        let submissions_cb = submissions_el.clone();
        let last_generated = last_generated.clone();
        let last_location = last_location.clone();
        let onclick = Closure::<dyn FnMut(Event)>::new(move |_| {
            let Some((image_url, prompt)) = last_generated.borrow().clone() else {
                return;
            };
            let (lat, lng) = last_location.borrow().unwrap_or((0.0, 0.0));
            let submission = Submission {
                id: make_id(),
                image_url,
                prompt,
                lat,
                lng,
                created_at: now_iso(),
            };
            {
                let mut session_ref = session.borrow_mut();
                session_ref.submissions.push(submission.clone());
                render_submissions(&document_cb, &session_ref, &submissions_cb);
            }
            net::send_message(&socket, &ClientMessage::SubmissionCreated { submission });
        });
        submit_button.add_event_listener_with_callback("click", onclick.as_ref().unchecked_ref())?;
        onclick.forget();
    }

    // Vote clicks are delegated from the list container so re-renders never
    // need to re-bind per-card listeners.
    {
        let session = session.clone();
        let window_cb = window.clone();
        let document_cb = document.clone();
        let submissions_listener = submissions_el.clone();
        let submissions_cb = submissions_el.clone();
        let onclick = Closure::<dyn FnMut(Event)>::new(move |event: Event| {
            let Some(target) = event.target() else {
                return;
            };
            let Ok(element) = target.dyn_into::<Element>() else {
                return;
            };
            let Ok(Some(button)) = element.closest("[data-vote]") else {
                return;
            };
            let Some(direction) = button.get_attribute("data-vote") else {
                return;
            };
            let Some(submission_id) = button.get_attribute("data-id") else {
                return;
            };
            let direction = match direction.as_str() {
                "up" => VoteDirection::Up,
                "down" => VoteDirection::Down,
                _ => return,
            };
            {
                let mut session_ref = session.borrow_mut();
                let user_id = session_ref.vote_user_id().to_string();
                session_ref.votes.vote(&submission_id, &user_id, direction);
                if let Ok(Some(storage)) = window_cb.local_storage() {
                    session_ref.votes.save_local(&storage);
                }
                render_submissions(&document_cb, &session_ref, &submissions_cb);
                push_votes_to_server(&window_cb, &session_ref);
            }
        });
        submissions_listener
            .add_event_listener_with_callback("click", onclick.as_ref().unchecked_ref())?;
        onclick.forget();
    }

    // Refit the current image when the window changes size. The mask does
    // not survive a refit; it is in image pixel space and the stack is
    // rebuilt from scratch.
    {
        let session = session.clone();
        let remount = remount.clone();
        let current_image = current_image.clone();
        let onresize = Closure::<dyn FnMut()>::new(move || {
            let image = current_image.borrow().clone();
            if let Some(image) = image {
                remount(&session, &image);
            }
        });
        window.add_event_listener_with_callback("resize", onresize.as_ref().unchecked_ref())?;
        onresize.forget();
    }

    // Initial image, if the page provides one.
    if let Some(container) = document.get_element_by_id(EDITOR_CONTAINER_ID) {
        if let Some(url) = container.get_attribute("data-image-url") {
            let source = match container.get_attribute("data-image-source").as_deref() {
                Some("streetview") => ImageSource::StreetView,
                _ => ImageSource::Modal,
            };
            start_image_load(&displayable_url(&url), source);
        }
    }

    Ok(())
}
