//! Runtime Events - 런타임 생명주기 이벤트
//!
//! 확장 등록, 초기화, 카테고리 수집/무효화, 훅 실패를 구독자에게 알린다.
//! 구독자가 없어도 발행은 실패하지 않는다.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::VecDeque;
use tokio::sync::broadcast;
use tracing::debug;

// ============================================================================
// RuntimeEvent
// ============================================================================

/// 런타임 이벤트
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeEvent {
    pub event_type: EventType,

    /// 이벤트 데이터
    pub data: Value,

    pub timestamp: chrono::DateTime<chrono::Utc>,

    /// 소스 (확장 ID, 카테고리 이름 등)
    pub source: String,
}

impl RuntimeEvent {
    pub fn new(event_type: EventType, data: Value, source: impl Into<String>) -> Self {
        Self {
            event_type,
            data,
            timestamp: chrono::Utc::now(),
            source: source.into(),
        }
    }

    pub fn extension_registered(id: &str, load_order: usize) -> Self {
        Self::new(
            EventType::ExtensionRegistered,
            json!({ "loadOrder": load_order }),
            id,
        )
    }

    pub fn initialized(extensions: usize, responders: usize) -> Self {
        Self::new(
            EventType::Initialized,
            json!({ "extensions": extensions, "responders": responders }),
            "runtime",
        )
    }

    pub fn category_collected(category: &str, items: usize) -> Self {
        Self::new(EventType::CategoryCollected, json!({ "items": items }), category)
    }

    /// `category`가 None이면 전체 무효화
    pub fn category_invalidated(category: Option<&str>) -> Self {
        Self::new(
            EventType::CategoryInvalidated,
            json!({ "all": category.is_none() }),
            category.unwrap_or("*"),
        )
    }

    pub fn invocation_failed(hook: &str, error: &prana_foundation::Error) -> Self {
        Self::new(
            EventType::InvocationFailed,
            json!({
                "error": error.to_string(),
                "extension": error.extension(),
            }),
            hook,
        )
    }
}

/// 이벤트 타입
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    ExtensionRegistered,
    Initialized,
    CategoryCollected,
    CategoryInvalidated,
    InvocationFailed,
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::ExtensionRegistered => "extension_registered",
            Self::Initialized => "initialized",
            Self::CategoryCollected => "category_collected",
            Self::CategoryInvalidated => "category_invalidated",
            Self::InvocationFailed => "invocation_failed",
        };
        f.write_str(name)
    }
}

// ============================================================================
// EventBus
// ============================================================================

/// 이벤트 버스 - 발행 및 구독
pub struct EventBus {
    sender: broadcast::Sender<RuntimeEvent>,

    /// 최근 이벤트 (최대 history_size개)
    history: Mutex<VecDeque<RuntimeEvent>>,

    history_size: usize,
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_capacity(256, 100)
    }

    pub fn with_capacity(channel_capacity: usize, history_size: usize) -> Self {
        let (sender, _) = broadcast::channel(channel_capacity.max(1));
        Self {
            sender,
            history: Mutex::new(VecDeque::with_capacity(history_size)),
            history_size,
        }
    }

    /// 이벤트 발행
    pub fn publish(&self, event: RuntimeEvent) {
        debug!("Publishing event: {} ({})", event.event_type, event.source);

        {
            let mut history = self.history.lock();
            if self.history_size > 0 {
                if history.len() >= self.history_size {
                    history.pop_front();
                }
                history.push_back(event.clone());
            }
        }

        // 구독자가 없어도 OK
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RuntimeEvent> {
        self.sender.subscribe()
    }

    pub fn history(&self) -> Vec<RuntimeEvent> {
        self.history.lock().iter().cloned().collect()
    }

    pub fn history_by_type(&self, event_type: EventType) -> Vec<RuntimeEvent> {
        self.history
            .lock()
            .iter()
            .filter(|e| e.event_type == event_type)
            .cloned()
            .collect()
    }

    pub fn clear_history(&self) {
        self.history.lock().clear();
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.sender.receiver_count())
            .field("history", &self.history.lock().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscribe_receives_events() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();

        bus.publish(RuntimeEvent::category_collected("widget", 3));

        let event = rx.recv().await.unwrap();
        assert_eq!(event.event_type, EventType::CategoryCollected);
        assert_eq!(event.source, "widget");
        assert_eq!(event.data["items"], 3);
    }

    #[test]
    fn test_history_is_bounded() {
        let bus = EventBus::with_capacity(8, 2);
        bus.publish(RuntimeEvent::extension_registered("a", 1));
        bus.publish(RuntimeEvent::extension_registered("b", 2));
        bus.publish(RuntimeEvent::category_invalidated(None));

        let history = bus.history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].source, "b");
        assert_eq!(history[1].source, "*");
        assert_eq!(bus.history_by_type(EventType::ExtensionRegistered).len(), 1);
    }
}
