//! 会话列表筛选与通话计时格式化

use serde::{Deserialize, Serialize};

use crate::types::{Chat, ChatType};

/// 会话列表标签页
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatTab {
    #[default]
    All,
    Groups,
    Channels,
}

impl ChatTab {
    fn matches(&self, chat_type: ChatType) -> bool {
        match self {
            ChatTab::All => true,
            ChatTab::Groups => chat_type == ChatType::Group,
            ChatTab::Channels => chat_type == ChatType::Channel,
        }
    }
}

/// 按标签页和搜索词筛选会话
///
/// 搜索不区分大小写，匹配会话名或最后一条消息；空白搜索词不过滤，
/// 非空白搜索词按原样匹配（不去掉首尾空格）
pub fn filter_chats<'a>(chats: &'a [Chat], tab: ChatTab, query: &str) -> Vec<&'a Chat> {
    let blank = query.trim().is_empty();
    let query = query.to_lowercase();

    chats
        .iter()
        .filter(|chat| tab.matches(chat.chat_type))
        .filter(|chat| {
            blank
                || chat.name.to_lowercase().contains(&query)
                || chat
                    .last_message
                    .as_deref()
                    .is_some_and(|m| m.to_lowercase().contains(&query))
        })
        .collect()
}

/// 通话时长 `MM:SS`，分钟不封顶
pub fn format_call_duration(seconds: i64) -> String {
    let seconds = seconds.max(0);
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chat(id: i64, name: &str, last: Option<&str>, chat_type: ChatType) -> Chat {
        Chat {
            id,
            name: name.to_string(),
            last_message: last.map(str::to_string),
            last_message_time: None,
            unread_count: 0,
            member_count: 1,
            chat_type,
        }
    }

    fn roster() -> Vec<Chat> {
        vec![
            chat(1, "Игровая Команда", Some("Готовы к рейду?"), ChatType::Group),
            chat(2, "Player_One", Some("GG WP!"), ChatType::Chat),
            chat(3, "Турнир 2024", Some("Регистрация открыта"), ChatType::Channel),
            chat(4, "Голосовая #1", None, ChatType::Voice),
        ]
    }

    fn ids(chats: Vec<&Chat>) -> Vec<i64> {
        chats.into_iter().map(|c| c.id).collect()
    }

    #[test]
    fn test_blank_query_keeps_all() {
        let chats = roster();
        assert_eq!(ids(filter_chats(&chats, ChatTab::All, "   ")), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_tabs() {
        let chats = roster();
        assert_eq!(ids(filter_chats(&chats, ChatTab::Groups, "")), vec![1]);
        assert_eq!(ids(filter_chats(&chats, ChatTab::Channels, "")), vec![3]);
    }

    #[test]
    fn test_query_matches_name_or_last_message() {
        let chats = roster();
        assert_eq!(ids(filter_chats(&chats, ChatTab::All, "player")), vec![2]);
        assert_eq!(ids(filter_chats(&chats, ChatTab::All, "РЕЙД")), vec![1]);
        assert_eq!(ids(filter_chats(&chats, ChatTab::Channels, "gg")), Vec::<i64>::new());
    }

    #[test]
    fn test_query_is_not_trimmed() {
        let chats = roster();
        assert!(filter_chats(&chats, ChatTab::All, "  player").is_empty());
        assert_eq!(ids(filter_chats(&chats, ChatTab::All, "к рейду")), vec![1]);
    }

    #[test]
    fn test_format_call_duration() {
        assert_eq!(format_call_duration(0), "00:00");
        assert_eq!(format_call_duration(125), "02:05");
        assert_eq!(format_call_duration(3725), "62:05");
        assert_eq!(format_call_duration(-3), "00:00");
    }
}
