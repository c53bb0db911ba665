use std::cell::RefCell;
use std::ops::ControlFlow;
use std::rc::Rc;

use chat_shared::ChatMessage;
use futures_channel::mpsc::{self, UnboundedSender};
use futures_util::sink::SinkExt as _;
use futures_util::stream::StreamExt;
use gloo_net::websocket::{Message as WsMessage, WebSocketError, futures::WebSocket};
use wasm_bindgen_futures::spawn_local;

use crate::view::Outbox;

type MessageHandler = Rc<dyn Fn(ChatMessage)>;
type ErrorHandler = Rc<dyn Fn(&WebSocketError)>;

struct Handlers
{
	on_message: Option<MessageHandler>,
	on_error: ErrorHandler,
}

impl Default for Handlers
{
	fn default() -> Self
	{
		Self
		{
			on_message: None,
			on_error: Rc::new(|e| log::error!("web socket error: {}", e)),
		}
	}
}

/// Handles one item off the socket stream. `Break` means the socket is done.
///
/// Handlers are cloned out of the cell before they run, so a handler may
/// register new ones.
fn dispatch(handlers: &RefCell<Handlers>, item: Result<WsMessage, WebSocketError>) -> ControlFlow<()>
{
	match item
	{
		Ok(WsMessage::Text(text)) =>
		{
			match ChatMessage::from_frame(&text)
			{
				Ok(msg) =>
				{
					log::debug!("Received: {}", msg);
					let on_message = handlers.borrow().on_message.clone();
					if let Some(handler) = on_message
					{
						handler(msg);
					}
				}
				Err(e) =>
				{
					log::error!("Failed to decode chat frame: {}. Raw: {}", e, text);
				}
			}
			ControlFlow::Continue(())
		}
		Ok(WsMessage::Bytes(bin)) =>
		{
			log::debug!("Ignoring binary frame (len: {})", bin.len());
			ControlFlow::Continue(())
		}
		Err(WebSocketError::ConnectionClose(event)) =>
		{
			log::info!("WebSocket closed (code: {}, reason: '{}')", event.code, event.reason);
			ControlFlow::Break(())
		}
		Err(e) =>
		{
			let on_error = Rc::clone(&handlers.borrow().on_error);
			on_error(&e);
			ControlFlow::Break(())
		}
	}
}

/// Owns the one socket the widget talks through. Opened once; a transport
/// error ends it for good.
pub struct ConnectionManager
{
	ws_sender: UnboundedSender<WsMessage>,
	handlers: Rc<RefCell<Handlers>>,
}

impl ConnectionManager
{
	pub fn connect(url: &str) -> anyhow::Result<Self>
	{
		log::info!("Connecting to WebSocket at: {}", url);
		let ws_socket = WebSocket::open(url)
			.map_err(|e| anyhow::anyhow!("failed to open WebSocket at {}: {}", url, e))?;

		let (mut ws_write_sink, mut ws_read_stream) = ws_socket.split();
		let (ws_sender, mut outgoing) = mpsc::unbounded::<WsMessage>();
		let handlers = Rc::new(RefCell::new(Handlers::default()));

		// Sender task
		spawn_local(async move
		{
			log::debug!("WS sender task started.");
			while let Some(frame) = outgoing.next().await
			{
				if let Err(e) = ws_write_sink.send(frame).await
				{
					log::error!("Error sending message via WebSocket: {}", e);
					break;
				}
			}
			log::debug!("WS sender task finished.");
		});

		// Receiver task
		let handlers_for_receiver = Rc::clone(&handlers);
		spawn_local(async move
		{
			log::debug!("WS receiver task started.");
			while let Some(item) = ws_read_stream.next().await
			{
				if dispatch(&handlers_for_receiver, item).is_break()
				{
					break;
				}
			}
			log::info!("WS receiver task finished.");
		});

		Ok(Self { ws_sender, handlers })
	}

	/// Queues `msg` for the socket. Empty messages are dropped here too.
	pub fn send(&self, msg: &ChatMessage)
	{
		if !msg.is_sendable()
		{
			log::debug!("refusing to send an empty message");
			return;
		}

		match msg.to_frame()
		{
			Ok(frame) =>
			{
				if self.ws_sender.unbounded_send(WsMessage::Text(frame)).is_ok()
				{
					log::debug!("Sent: {:?}", msg);
				}else
				{
					log::error!("Failed to send to WS task (channel closed)");
				}
			}
			Err(e) =>
			{
				log::error!("Serialization error for ChatMessage: {}", e);
			}
		}
	}

	pub fn on_message(&self, handler: impl Fn(ChatMessage) + 'static)
	{
		self.handlers.borrow_mut().on_message = Some(Rc::new(handler));
	}

	pub fn on_error(&self, handler: impl Fn(&WebSocketError) + 'static)
	{
		self.handlers.borrow_mut().on_error = Rc::new(handler);
	}
}

impl Outbox for ConnectionManager
{
	fn send(&self, msg: &ChatMessage)
	{
		ConnectionManager::send(self, msg);
	}
}
