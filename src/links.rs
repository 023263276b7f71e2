//! Marketplace search links for a brand line or model

const EBAY_SOLD_URL: &str = "https://www.ebay.com/sch/i.html?_nkw={q}&LH_Sold=1&LH_Complete=1";
const MERCARI_SOLD_URL: &str = "https://jp.mercari.com/search?keyword={q}&status=sold_out";

/// `BRAND keyword`; fallback buckets (`other-...`) search the brand alone
pub fn search_query(brand: &str, keyword: &str) -> String {
    let keyword = keyword.trim();
    if keyword.is_empty() || keyword.starts_with("other-") || keyword.eq_ignore_ascii_case(brand) {
        brand.to_string()
    } else {
        format!("{} {}", brand, keyword)
    }
}

fn fill(template: &str, query: &str) -> String {
    template.replace("{q}", &urlencoding::encode(query))
}

pub fn ebay_url(brand: &str, keyword: &str) -> String {
    fill(EBAY_SOLD_URL, &search_query(brand, keyword))
}

pub fn mercari_url(brand: &str, keyword: &str) -> String {
    fill(MERCARI_SOLD_URL, &search_query(brand, keyword))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_is_percent_encoded() {
        assert_eq!(
            ebay_url("CASIO", "G-SHOCK"),
            "https://www.ebay.com/sch/i.html?_nkw=CASIO%20G-SHOCK&LH_Sold=1&LH_Complete=1"
        );
        assert_eq!(
            mercari_url("SEIKO", "Dolce & Exceline"),
            "https://jp.mercari.com/search?keyword=SEIKO%20Dolce%20%26%20Exceline&status=sold_out"
        );
    }

    #[test]
    fn test_fallback_bucket_searches_brand_only() {
        assert_eq!(search_query("CASIO", "other-CASIO"), "CASIO");
        assert_eq!(search_query("CASIO", ""), "CASIO");
        assert_eq!(search_query("CASIO", "DW-5600"), "CASIO DW-5600");
    }
}
