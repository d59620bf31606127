/// Identity and target of the outbound chat session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IrcConfig {
    /// `host:port` of the IRC server.
    pub server: String,
    pub nickname: String,
    pub username: String,
    pub realname: String,
    /// The only channel the relay joins, posts to and listens on.
    pub channel: String,
}

impl Default for IrcConfig {
    fn default() -> Self {
        Self {
            server: "irc.twice-irc.de:6667".to_owned(),
            nickname: "i3".to_owned(),
            username: "i3".to_owned(),
            realname: "http://build.i3wm.org/".to_owned(),
            channel: "#i3".to_owned(),
        }
    }
}
