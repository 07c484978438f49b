//! Transient notice with an optional retry action.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use leptos::prelude::*;

const NOTICE_TTL: Duration = Duration::from_millis(6000);

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticeKind {
	Warning,
	Error,
}

impl NoticeKind {
	fn class(self) -> &'static str {
		match self {
			Self::Warning => "notice notice-warning",
			Self::Error => "notice notice-error",
		}
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct NoticeMessage {
	pub id: u64,
	pub kind: NoticeKind,
	pub text: String,
	pub retryable: bool,
}

impl NoticeMessage {
	pub fn new(kind: NoticeKind, text: impl Into<String>, retryable: bool) -> Self {
		Self {
			id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
			kind,
			text: text.into(),
			retryable,
		}
	}
}

/// Shows `message` until dismissed or it times out.
#[component]
pub fn Notice(message: RwSignal<Option<NoticeMessage>>, on_retry: Callback<()>) -> impl IntoView {
	Effect::new(move |_| {
		let Some(id) = message.with(|m| m.as_ref().map(|m| m.id)) else {
			return;
		};
		set_timeout(
			move || {
				// Only clear the notice this timer was started for.
				let _ = message.try_update(|current| {
					if current.as_ref().is_some_and(|m| m.id == id) {
						*current = None;
					}
				});
			},
			NOTICE_TTL,
		);
	});

	view! {
		<div class="notice-slot">
			{move || {
				message
					.get()
					.map(|msg| {
						view! {
							<div class={msg.kind.class()} role="alert">
								<span class="notice-text">{msg.text.clone()}</span>
								{msg
									.retryable
									.then(|| {
										view! {
											<button on:click=move |_| {
												message.set(None);
												on_retry.run(());
											}>"Retry"</button>
										}
									})}
								<button on:click=move |_| message.set(None)>"Dismiss"</button>
							</div>
						}
					})
			}}
		</div>
	}
}
