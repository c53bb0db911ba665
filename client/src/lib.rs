pub mod connection;
pub mod dom;
pub mod view;

use std::rc::Rc;

use anyhow::Context as _;
use chat_shared::{CHAT_WINDOW_ID, INPUT_FORM_ID};
use wasm_bindgen::JsCast;
#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;
use web_sys::{Element, HtmlFormElement};

use crate::connection::ConnectionManager;
use crate::view::ViewController;

/// Everything the event handlers need, built once at startup.
pub struct ChatContext
{
	pub connection: ConnectionManager,
	pub view: ViewController<Element>,
}

pub fn start() -> anyhow::Result<()>
{
	let window = web_sys::window().context("no global window")?;
	let document = window.document().context("window has no document")?;
	let host = window.location().host().map_err(dom::js_error)?;

	let panel = dom::element_by_id(&document, CHAT_WINDOW_ID)?;
	let form = dom::element_by_id(&document, INPUT_FORM_ID)?
		.dyn_into::<HtmlFormElement>()
		.map_err(|_| anyhow::anyhow!("'{}' is not a form", INPUT_FORM_ID))?;

	let connection = ConnectionManager::connect(&chat_shared::chat_url(&host))?;
	let ctx = Rc::new(ChatContext
	{
		connection,
		view: ViewController::new(panel),
	});

	let weak_ctx = Rc::downgrade(&ctx);
	ctx.connection.on_message(move |msg|
	{
		if let Some(ctx) = weak_ctx.upgrade()
		{
			ctx.view.render_message(&msg);
		}
	});

	dom::bind_submit(&form, ctx)?;
	Ok(())
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn main_wasm()
{
	console_error_panic_hook::set_once();
	wasm_logger::init(wasm_logger::Config::default());
	log::info!("chat widget starting");

	if let Err(e) = start()
	{
		log::error!("chat widget failed to start: {:#}", e);
	}
}
