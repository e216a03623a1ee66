/// Title of the notification.
pub const TITLE: &str = "android.title";
/// Main text of the notification.
pub const TEXT: &str = "android.text";
/// Title shown in the expanded big-text layout.
pub const TITLE_BIG: &str = "android.title.big";
/// Text shown in the expanded big-text layout.
pub const BIG_TEXT: &str = "android.bigText";
/// Style template in use.
pub const TEMPLATE: &str = "android.template";
/// Legacy list of person URIs.
pub const PEOPLE: &str = "android.people";
/// Structured list of persons.
pub const PEOPLE_LIST: &str = "android.people.list";

/// Big text style template.
pub const TEMPLATE_BIG_TEXT: &str = "android.app.Notification$BigTextStyle";
/// Inbox style template.
pub const TEMPLATE_INBOX: &str = "android.app.Notification$InboxStyle";
/// Big picture style template.
pub const TEMPLATE_BIG_PICTURE: &str = "android.app.Notification$BigPictureStyle";
/// Media style template.
pub const TEMPLATE_MEDIA: &str = "android.app.Notification$MediaStyle";
/// Messaging style template.
pub const TEMPLATE_MESSAGING: &str = "android.app.Notification$MessagingStyle";
