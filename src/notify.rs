//! Review notification text and the delivery seam.

use crate::api::ReviewAttempt;
use anyhow::Result;

/// Public site root the lesson links point at.
const SITE_ORIGIN: &str = "https://dvmn.org";

/// Outbound notification channel, in production a Telegram chat. Delivery
/// failures are returned to the polling loop, which holds its cursor so the
/// same review is fetched and retried on the next iteration.
pub trait Notifier {
    fn notify(&self, text: &str) -> Result<()>;
}

/// Render the chat message for a reviewed submission.
///
/// Two fixed templates, selected by the verdict; both carry the lesson
/// title and a direct link to the lesson page.
pub fn review_message(attempt: &ReviewAttempt) -> String {
    if attempt.is_negative {
        format!(
            "У вас проверили работу \"{}\"\nК сожалению в работе нашлись ошибки.\n{}{}",
            attempt.lesson_title, SITE_ORIGIN, attempt.lesson_url
        )
    } else {
        format!(
            "У вас проверили работу \"{}\"\nПреподавателю все понравилось, можно приступать к следующему уроку.\n{}{}",
            attempt.lesson_title, SITE_ORIGIN, attempt.lesson_url
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attempt(title: &str, url: &str, is_negative: bool) -> ReviewAttempt {
        ReviewAttempt {
            lesson_title: title.to_string(),
            lesson_url: url.to_string(),
            is_negative,
        }
    }

    #[test]
    fn test_negative_review_message() {
        let text = review_message(&attempt("Python", "/1/", true));

        assert_eq!(
            text,
            "У вас проверили работу \"Python\"\nК сожалению в работе нашлись ошибки.\nhttps://dvmn.org/1/"
        );
    }

    #[test]
    fn test_positive_review_message() {
        let text = review_message(&attempt(
            "Отправь СМС всем",
            "/modules/13/lesson/42/",
            false,
        ));

        assert_eq!(
            text,
            "У вас проверили работу \"Отправь СМС всем\"\nПреподавателю все понравилось, можно приступать к следующему уроку.\nhttps://dvmn.org/modules/13/lesson/42/"
        );
    }

    #[test]
    fn test_title_is_quoted_verbatim() {
        let text = review_message(&attempt("Урок \"о кавычках\"", "/q/", false));

        assert!(text.starts_with("У вас проверили работу \"Урок \"о кавычках\"\"\n"));
    }
}
