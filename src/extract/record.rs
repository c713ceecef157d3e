/// One catalog item as it appears on a listing page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    pub name: String,

    /// Price in currency units; 0 when the price element is missing
    pub price: u64,

    /// Units in stock; `None` when the listing does not say
    pub stock: Option<u32>,

    pub image_url: String,

    /// Deduplication key; an empty id never deduplicates
    pub product_id: String,

    /// Detail page, derived from `product_id`
    pub product_url: String,

    /// Printed set code, when the markup carries one
    pub pack_code: String,
}

impl Record {
    /// Key used for deduplication across a whole crawl run
    pub fn dedup_key(&self) -> Option<&str> {
        if self.product_id.is_empty() {
            None
        } else {
            Some(&self.product_id)
        }
    }
}
