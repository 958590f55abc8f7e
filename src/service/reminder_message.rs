use crate::models::event::Event;

pub struct ReminderMessageService;

impl ReminderMessageService {
    /// HTML body for the chat notifier. Event text is escaped since the bot
    /// API rejects messages with stray markup.
    pub fn build_message(event: &Event) -> String {
        format!(
            "🔔 <b>Meeting Reminder</b>\n\n\
             📅 <b>{title}</b>\n\
             ⏰ Time: {start} - {end}\n\
             📍 Location: {location}\n\
             👥 Attendees: {attendees}\n\
             📝 Description: {description}\n\n\
             Please join your meeting now!",
            title = escape_html(&event.title),
            start = escape_html(&event.start_time),
            end = escape_html(&event.end_time),
            location = escape_html(&event.location),
            attendees = escape_html(&event.attendees.join(", ")),
            description = escape_html(&event.description),
        )
    }
}

fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}
