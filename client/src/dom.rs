use std::rc::Rc;

use anyhow::anyhow;
use gloo_utils::errors::JsError;
use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsValue;
use web_sys::{Document, Element, Event, HtmlFormElement, HtmlInputElement};

use crate::ChatContext;
use crate::view::{Panel, SubmitForm};

pub fn js_error(value: JsValue) -> anyhow::Error
{
	match JsError::try_from(value)
	{
		Ok(err) => anyhow!("{}", err),
		Err(not_err) => anyhow!("{}", not_err),
	}
}

pub fn element_by_id(document: &Document, id: &str) -> anyhow::Result<Element>
{
	document
		.get_element_by_id(id)
		.ok_or_else(|| anyhow!("page has no element with id '{}'", id))
}

impl Panel for Element
{
	// Appending markup keeps the existing lines' nodes intact.
	fn append_html(&self, html: &str)
	{
		if let Err(e) = self.insert_adjacent_html("beforeend", html)
		{
			log::error!("failed to append to panel: {}", js_error(e));
		}
	}

	fn scroll_to_bottom(&self)
	{
		self.set_scroll_top(self.scroll_height());
	}
}

fn input(form: &HtmlFormElement, name: &str) -> Option<HtmlInputElement>
{
	form.query_selector(&format!("[name=\"{}\"]", name))
		.ok()
		.flatten()
		.and_then(|element| element.dyn_into::<HtmlInputElement>().ok())
}

impl SubmitForm for HtmlFormElement
{
	fn field(&self, name: &str) -> Option<String>
	{
		input(self, name).map(|field| field.value())
	}

	fn set_field(&self, name: &str, value: &str)
	{
		if let Some(field) = input(self, name)
		{
			field.set_value(value);
		}
	}
}

/// Routes `submit` events on `form` to the view controller. The listener lives
/// as long as the page.
pub fn bind_submit(form: &HtmlFormElement, ctx: Rc<ChatContext>) -> anyhow::Result<()>
{
	let on_submit = Closure::<dyn Fn(Event)>::new(move |event: Event|
	{
		event.prevent_default();

		let Some(form) = event.target().and_then(|t| t.dyn_into::<HtmlFormElement>().ok()) else
		{
			log::error!("submit event did not come from a form");
			return;
		};
		ctx.view.on_submit(&form, &ctx.connection);
	});

	form.add_event_listener_with_callback("submit", on_submit.as_ref().unchecked_ref())
		.map_err(js_error)?;
	on_submit.forget();
	Ok(())
}
