use chat_shared::{ChatMessage, MESSAGE_FIELD, NICK_FIELD};

/// Scrollable region the rendered lines accumulate in.
pub trait Panel
{
	fn append_html(&self, html: &str);
	fn scroll_to_bottom(&self);
}

/// The submitting form. `None` means the form has no field by that name.
pub trait SubmitForm
{
	fn field(&self, name: &str) -> Option<String>;
	fn set_field(&self, name: &str, value: &str);
}

/// Where submitted messages go.
pub trait Outbox
{
	fn send(&self, msg: &ChatMessage);
}

pub struct ViewController<P>
{
	panel: P,
}

impl<P: Panel> ViewController<P>
{
	pub fn new(panel: P) -> Self
	{
		Self { panel }
	}

	/// Handles one form submission. The message field is cleared whether or not
	/// anything is sent; the nick is passed through untouched.
	pub fn on_submit(&self, form: &impl SubmitForm, outbox: &impl Outbox)
	{
		let (Some(nick), Some(message)) = (form.field(NICK_FIELD), form.field(MESSAGE_FIELD)) else
		{
			log::error!("input form is missing its '{}' or '{}' field", NICK_FIELD, MESSAGE_FIELD);
			return;
		};

		form.set_field(MESSAGE_FIELD, "");

		let msg = ChatMessage::new(nick, message);
		if msg.is_sendable()
		{
			outbox.send(&msg);
		}else
		{
			log::debug!("empty message, not sending.");
		}
	}

	pub fn render_message(&self, msg: &ChatMessage)
	{
		self.panel.append_html(&msg.render_html());
		self.panel.scroll_to_bottom();
	}
}
