use std::str::FromStr;

use sea_orm::ActiveValue::{NotSet, Set};
use tracing::warn;

use crate::storage::models::{
    Band, Event, EventStatus, NewEvent, NewTapLog, NewWindow, RedirectMode, TapLog, Window,
    WindowKind,
};
use migration::entities::{band, event, tap_log, window};

/// 将 Sea-ORM Model 转换为 Event
pub fn model_to_event(model: event::Model) -> Event {
    let status = EventStatus::from_str(&model.status).unwrap_or_else(|_| {
        warn!(
            "Event {} has unknown status '{}', treating as draft",
            model.id, model.status
        );
        EventStatus::Draft
    });

    Event {
        id: model.id,
        org_id: model.org_id,
        name: model.name,
        status,
        schedule_mode: model.schedule_mode,
        fallback_url: model.fallback_url.filter(|u| !u.trim().is_empty()),
        timezone: model.timezone,
        estimated_attendees: model.estimated_attendees,
        created_at: model.created_at,
    }
}

/// 将 Sea-ORM Model 转换为 Window
///
/// 未知类型按 live 处理并记录警告。
pub fn model_to_window(model: window::Model) -> Window {
    let kind = WindowKind::from_str(&model.kind).unwrap_or_else(|_| {
        warn!(
            "Window {} has unknown kind '{}', treating as live",
            model.id, model.kind
        );
        WindowKind::Live
    });

    Window {
        id: model.id,
        event_id: model.event_id,
        kind,
        title: model.title,
        url: model.url,
        start_at: model.start_at,
        end_at: model.end_at,
        is_active: model.is_active,
        created_at: model.created_at,
    }
}

pub fn model_to_band(model: band::Model) -> Band {
    Band {
        id: model.id,
        event_id: model.event_id,
        code: model.code,
        deleted_at: model.deleted_at,
        tap_count: model.tap_count,
        last_tapped_at: model.last_tapped_at,
        tag: model.tag,
    }
}

pub fn model_to_tap_log(model: tap_log::Model) -> TapLog {
    TapLog {
        id: model.id,
        band_id: model.band_id,
        event_id: model.event_id,
        window_id: model.window_id,
        url: model.url,
        mode: RedirectMode::from_str(&model.mode).unwrap_or(RedirectMode::Fallback),
        user_agent: model.user_agent,
        ip_address: model.ip_address,
        tapped_at: model.tapped_at,
    }
}

pub fn new_event_to_active_model(new: &NewEvent) -> event::ActiveModel {
    event::ActiveModel {
        id: NotSet,
        org_id: Set(new.org_id),
        name: Set(new.name.clone()),
        status: Set(new.status.as_ref().to_string()),
        schedule_mode: Set(new.schedule_mode),
        fallback_url: Set(new.fallback_url.clone()),
        timezone: Set(new.timezone.clone()),
        estimated_attendees: Set(new.estimated_attendees),
        created_at: Set(chrono::Utc::now()),
    }
}

pub fn new_window_to_active_model(new: &NewWindow) -> window::ActiveModel {
    window::ActiveModel {
        id: NotSet,
        event_id: Set(new.event_id),
        kind: Set(new.kind.as_ref().to_string()),
        title: Set(new.title.clone()),
        url: Set(new.url.clone()),
        start_at: Set(new.start_at),
        end_at: Set(new.end_at),
        is_active: Set(false),
        created_at: Set(chrono::Utc::now()),
    }
}

pub fn new_band_to_active_model(event_id: i64, code: &str) -> band::ActiveModel {
    band::ActiveModel {
        id: NotSet,
        event_id: Set(event_id),
        code: Set(code.to_string()),
        deleted_at: Set(None),
        tap_count: Set(0),
        last_tapped_at: Set(None),
        tag: Set(None),
    }
}

pub fn new_tap_log_to_active_model(new: &NewTapLog) -> tap_log::ActiveModel {
    tap_log::ActiveModel {
        id: NotSet,
        band_id: Set(new.band_id),
        event_id: Set(new.event_id),
        window_id: Set(new.window_id),
        url: Set(new.url.clone()),
        mode: Set(new.mode.as_ref().to_string()),
        user_agent: Set(new.user_agent.clone()),
        ip_address: Set(new.ip_address.clone()),
        tapped_at: Set(new.tapped_at),
    }
}
