//! Search requests and caller normalization.

use serde::{Deserialize, Serialize};

use crate::query::Query;
use crate::source::{ChannelId, GroupId, Scope, UserId};

/// Whoever issued a command: one shape for every kind of command context.
pub trait Caller {
    /// The user who issued the command.
    fn author(&self) -> UserId;

    /// The channel the command was issued in.
    fn channel_scope(&self) -> ChannelId;

    /// The group the channel belongs to, if any.
    fn guild_scope(&self) -> Option<GroupId>;

    /// The widest scope a search from this caller covers.
    fn search_scope(&self) -> Scope {
        match self.guild_scope() {
            Some(group) => Scope::Group(group),
            None => Scope::Channel(self.channel_scope()),
        }
    }
}

/// A plain command context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandContext {
    pub author: UserId,
    pub channel: ChannelId,
    pub guild: Option<GroupId>,
}

impl Caller for CommandContext {
    fn author(&self) -> UserId {
        self.author
    }

    fn channel_scope(&self) -> ChannelId {
        self.channel
    }

    fn guild_scope(&self) -> Option<GroupId> {
        self.guild
    }
}

/// What to search and where.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub scope: Scope,
    pub query: Query,
}

impl SearchRequest {
    pub fn new(scope: Scope, query: Query) -> Self {
        SearchRequest { scope, query }
    }

    /// A request covering the caller's whole scope.
    pub fn for_caller<C: Caller + ?Sized>(caller: &C, query: Query) -> Self {
        SearchRequest {
            scope: caller.search_scope(),
            query,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_from_caller() {
        let in_group = CommandContext {
            author: UserId(1),
            channel: ChannelId(2),
            guild: Some(GroupId(3)),
        };
        let direct = CommandContext {
            guild: None,
            ..in_group
        };
        let query = Query::builder().filename("x").build().unwrap();

        assert_eq!(
            SearchRequest::for_caller(&in_group, query.clone()).scope,
            Scope::Group(GroupId(3))
        );
        assert_eq!(
            SearchRequest::for_caller(&direct, query).scope,
            Scope::Channel(ChannelId(2))
        );
    }
}
