//! Resolves which webhooks fire for an event.

use relay_events::Event;

use crate::error::WebhookResult;
use crate::hook::{WebHook, WebHookEventFilter};
use crate::storage::WebhookStorage;

/// Builds the filter describing every target and the kind of `event`.
///
/// The primary target comes first, followed by the extra targets in order.
pub fn build_filter(event: &Event) -> WebHookEventFilter {
    let (target_types, target_values) = event
        .all_targets()
        .map(|t| (t.target_type.clone(), t.value.clone()))
        .unzip();

    WebHookEventFilter {
        target_types,
        target_values,
        kind_types: vec![event.kind.kind_type.to_string()],
        kind_names: vec![event.kind.name.clone()],
        ..Default::default()
    }
}

/// Asks the store for every hook matching `event`.
pub async fn find_hooks<S>(storage: &S, event: &Event) -> WebhookResult<Vec<WebHook>>
where
    S: WebhookStorage + ?Sized,
{
    let filter = build_filter(event);
    storage.find_by_event(&filter, event.succeeded()).await
}
