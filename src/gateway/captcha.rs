//! Anti-bot challenge detection
//!
//! Pure classifier over the final URL and the page text. Keywords are
//! compared case-insensitively; Hangul keywords are unaffected by casefolding.

use crate::config::RankConfig;

#[derive(Debug, Clone)]
pub struct CaptchaDetector {
    url_keywords: Vec<String>,
    text_keywords: Vec<String>,
}

impl CaptchaDetector {
    #[must_use]
    pub fn new<U, T>(url_keywords: U, text_keywords: T) -> Self
    where
        U: IntoIterator,
        U::Item: AsRef<str>,
        T: IntoIterator,
        T::Item: AsRef<str>,
    {
        let normalize = |k: &str| k.trim().to_lowercase();
        Self {
            url_keywords: url_keywords
                .into_iter()
                .map(|k| normalize(k.as_ref()))
                .filter(|k| !k.is_empty())
                .collect(),
            text_keywords: text_keywords
                .into_iter()
                .map(|k| normalize(k.as_ref()))
                .filter(|k| !k.is_empty())
                .collect(),
        }
    }

    #[must_use]
    pub fn from_config(config: &RankConfig) -> Self {
        Self::new(config.block_url_keywords(), config.block_text_keywords())
    }

    /// True when the page looks like a challenge rather than results
    #[must_use]
    pub fn is_blocked(&self, final_url: &str, page_text: &str) -> bool {
        self.blocked_by_url(final_url) || self.blocked_by_text(page_text)
    }

    #[must_use]
    pub fn blocked_by_url(&self, final_url: &str) -> bool {
        let url = final_url.to_lowercase();
        self.url_keywords.iter().any(|k| url.contains(k.as_str()))
    }

    #[must_use]
    pub fn blocked_by_text(&self, page_text: &str) -> bool {
        if self.text_keywords.is_empty() {
            return false;
        }
        let text = page_text.to_lowercase();
        self.text_keywords.iter().any(|k| text.contains(k.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detector() -> CaptchaDetector {
        CaptchaDetector::from_config(&RankConfig::default())
    }

    #[test]
    fn url_keyword_blocks_regardless_of_case() {
        let d = detector();
        assert!(d.is_blocked("https://m.search.naver.com/CAPTCHA?ref=1", ""));
        assert!(d.is_blocked("https://nid.naver.com/robot/check", "<html></html>"));
    }

    #[test]
    fn hangul_text_keyword_blocks() {
        let d = detector();
        assert!(d.is_blocked(
            "https://m.search.naver.com/search.naver?query=x",
            "<p>자동입력 방지를 위해 보안문자를 입력해주세요</p>"
        ));
    }

    #[test]
    fn clean_results_page_passes() {
        let d = detector();
        assert!(!d.is_blocked(
            "https://m.search.naver.com/search.naver?query=%EA%B0%95%EB%82%A8%EB%A7%9B%EC%A7%91",
            "<ul class='list_place'><li>교촌치킨 강남점 치킨 리뷰 120</li></ul>"
        ));
    }

    #[test]
    fn everyday_words_in_listings_do_not_block() {
        let d = detector();
        assert!(!d.is_blocked(
            "https://m.search.naver.com/search.naver?query=%ED%99%8D%EB%8C%80",
            "<li>로봇카페 홍대점</li><li>자외선 차단 필름 시공</li><li>소음 차단 스터디카페</li>"
        ));
    }

    #[test]
    fn empty_keyword_lists_never_block() {
        let d = CaptchaDetector::new(Vec::<String>::new(), Vec::<String>::new());
        assert!(!d.is_blocked("https://x/captcha", "captcha"));
    }
}
