//! Region and category tags derived from a search keyword

use serde::{Deserialize, Serialize};

pub const DEFAULT_REGION: &str = "전국";
pub const DEFAULT_CATEGORY: &str = "기타";

/// Checked in order; the first one contained in the keyword wins
const REGIONS: [&str; 33] = [
    "서울", "부산", "대구", "인천", "광주", "대전", "울산", "세종", "경기", "강원", "충북",
    "충남", "전북", "전남", "경북", "경남", "제주", "강남", "홍대", "명동", "이태원", "신촌",
    "건대", "상암", "여의도", "해운대", "서면", "동성로", "중구", "남구", "북구", "동구", "서구",
];

const CATEGORIES: [(&str, &[&str]); 9] = [
    ("맛집", &["맛집", "음식점", "레스토랑"]),
    ("카페", &["카페", "커피", "디저트"]),
    ("치킨", &["치킨", "닭", "프라이드"]),
    ("피자", &["피자"]),
    ("중국음식", &["중국집", "중화요리", "짜장면"]),
    ("일식", &["일식", "초밥", "라멘", "우동"]),
    ("한식", &["한식", "불고기", "갈비", "김치찌개"]),
    ("분식", &["분식", "떡볶이", "순대", "김밥"]),
    ("패스트푸드", &["패스트푸드", "햄버거", "버거"]),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordProfile {
    pub region: String,
    pub category: String,
}

impl KeywordProfile {
    #[must_use]
    pub fn from_keyword(keyword: &str) -> Self {
        let lowered = keyword.to_lowercase();
        let region = REGIONS
            .iter()
            .find(|r| keyword.contains(*r))
            .copied()
            .unwrap_or(DEFAULT_REGION);
        let category = CATEGORIES
            .iter()
            .find(|(_, synonyms)| synonyms.iter().any(|s| lowered.contains(s)))
            .map_or(DEFAULT_CATEGORY, |(name, _)| *name);

        Self {
            region: region.to_string(),
            category: category.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn region_and_category() {
        let profile = KeywordProfile::from_keyword("강남 치킨 맛집");
        assert_eq!(profile.region, "강남");
        // 맛집 is listed before 치킨
        assert_eq!(profile.category, "맛집");

        let profile = KeywordProfile::from_keyword("해운대 초밥");
        assert_eq!(profile.region, "해운대");
        assert_eq!(profile.category, "일식");
    }

    #[test]
    fn defaults_when_nothing_known() {
        let profile = KeywordProfile::from_keyword("coffee near me");
        assert_eq!(profile.region, DEFAULT_REGION);
        assert_eq!(profile.category, DEFAULT_CATEGORY);
    }
}
