//! Auto-route evaluation.

use flow_script::{AutoRoute, MessageId};
use tracing::debug;

use super::DataAccessor;

/// Pick the target of an auto route: the first rule whose condition holds,
/// else the route's default. `None` means the route leads nowhere.
pub async fn resolve_route<A>(route: &AutoRoute, data: &A) -> Option<MessageId>
where
    A: DataAccessor + ?Sized,
{
    for rule in &route.routes {
        let current = match rule.condition.key() {
            Some(key) => data.get_value(key).await,
            None => None,
        };
        if rule.condition.evaluate(current.as_ref()) {
            debug!(target = %rule.next_message_id, "auto route rule matched");
            return Some(rule.next_message_id);
        }
    }
    route.default_next
}
