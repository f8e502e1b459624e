use crate::core::acquisition::encode_frame_as_jpeg;
use crate::core::{CameraFrame, Condition, ImagePayload, Listing};
use crate::utils::error::Result;
use chrono::Utc;
use std::collections::vec_deque;
use std::collections::VecDeque;
use uuid::Uuid;

/// 已刊登的商品，最新的在最前面
#[derive(Debug, Clone, Default)]
pub struct ListingFeed {
    listings: VecDeque<Listing>,
}

impl ListingFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// 預設展示用的三筆商品，圖片是單色的 JPEG 佔位圖
    pub fn with_sample_listings() -> Result<Self> {
        let samples = [
            (
                "s3",
                "Riley Chen",
                "Mechanical Keyboard RGB",
                "Custom build mechanical keyboard with brown switches. Amazing typing experience for coding.",
                6500.0,
                "Peripherals",
                Condition::LikeNew,
                [88, 86, 214],
            ),
            (
                "s2",
                "Jordan Lee",
                "iPad Air 4th Gen 64GB",
                "Good condition, small scratch on the back. Screen is perfect. Includes Apple Pencil 2.",
                38000.0,
                "Tablets",
                Condition::Good,
                [142, 142, 147],
            ),
            (
                "s1",
                "Alex Smith",
                "Sony WH-1000XM4 Headphones",
                "Barely used headphones. Excellent noise cancellation. Comes with case and original cables.",
                15000.0,
                "Audio",
                Condition::LikeNew,
                [28, 28, 30],
            ),
        ];

        let mut feed = Self::new();
        for (seller_id, seller_name, title, description, price, category, condition, color) in
            samples
        {
            let image = placeholder_image(color)?;
            feed.publish(Listing {
                id: Uuid::new_v4(),
                title: title.to_string(),
                description: description.to_string(),
                price,
                category: category.to_string(),
                condition,
                image,
                seller_id: seller_id.to_string(),
                seller_name: seller_name.to_string(),
                created_at: Utc::now(),
            });
        }
        Ok(feed)
    }

    pub fn publish(&mut self, listing: Listing) {
        tracing::debug!("Publishing listing {} ({})", listing.id, listing.title);
        self.listings.push_front(listing);
    }

    pub fn len(&self) -> usize {
        self.listings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listings.is_empty()
    }

    pub fn iter(&self) -> vec_deque::Iter<'_, Listing> {
        self.listings.iter()
    }

    pub fn get(&self, id: &Uuid) -> Option<&Listing> {
        self.listings.iter().find(|l| &l.id == id)
    }

    /// title 或 category 含有 query (不分大小寫)；只有空字串回傳全部
    pub fn filter(&self, query: &str) -> FeedFilter<'_> {
        FeedFilter {
            inner: self.listings.iter(),
            needle: query.to_lowercase(),
        }
    }
}

const PLACEHOLDER_SIZE: u32 = 64;

fn placeholder_image(color: [u8; 3]) -> Result<ImagePayload> {
    let pixels = (PLACEHOLDER_SIZE * PLACEHOLDER_SIZE) as usize;
    encode_frame_as_jpeg(&CameraFrame {
        width: PLACEHOLDER_SIZE,
        height: PLACEHOLDER_SIZE,
        rgb: color.repeat(pixels),
    })
}

/// `ListingFeed::filter` 的惰性結果；clone 之後可以重新迭代
#[derive(Debug, Clone)]
pub struct FeedFilter<'a> {
    inner: vec_deque::Iter<'a, Listing>,
    needle: String,
}

impl<'a> Iterator for FeedFilter<'a> {
    type Item = &'a Listing;

    fn next(&mut self) -> Option<Self::Item> {
        if self.needle.is_empty() {
            return self.inner.next();
        }
        let needle = &self.needle;
        self.inner.by_ref().find(|listing| {
            listing.title.to_lowercase().contains(needle.as_str())
                || listing.category.to_lowercase().contains(needle.as_str())
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let (lower, upper) = self.inner.size_hint();
        if self.needle.is_empty() {
            (lower, upper)
        } else {
            (0, upper)
        }
    }
}
