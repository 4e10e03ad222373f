//! Shops: priced, stock-limited item offers with periodic restocking.

use std::collections::BTreeMap;

use citysim_types::{ItemName, ShopOffer};

use crate::error::WorldError;

/// One item a shop sells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShopItem {
    /// Price per unit.
    pub price: i64,
    /// Units currently in stock.
    pub stock: u32,
    /// Restocking never raises stock above this.
    pub max_stock: u32,
}

/// Shop payload of a facility.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Shop {
    /// Offers keyed by item.
    pub offers: BTreeMap<ItemName, ShopItem>,
    /// Rounds between restocks; 0 disables restocking.
    pub restock_interval: u64,
}

impl Shop {
    /// Create a shop with the given offers and restock interval.
    pub const fn new(offers: BTreeMap<ItemName, ShopItem>, restock_interval: u64) -> Self {
        Self {
            offers,
            restock_interval,
        }
    }

    /// Items the shop offers, in name order.
    pub fn offered_items(&self) -> impl Iterator<Item = &ItemName> {
        self.offers.keys()
    }

    /// Units of `item` in stock (0 if not offered).
    pub fn stock(&self, item: &str) -> u32 {
        self.offers.get(item).map_or(0, |o| o.stock)
    }

    /// Price of `item`, if offered.
    pub fn price(&self, item: &str) -> Option<i64> {
        self.offers.get(item).map(|o| o.price)
    }

    /// Total price of `amount` units, checking the offer and the stock.
    pub fn quote(&self, item: &str, amount: u32) -> Result<i64, WorldError> {
        let offer = self
            .offers
            .get(item)
            .ok_or_else(|| WorldError::NotOffered(ItemName::from(item)))?;
        if offer.stock < amount {
            return Err(WorldError::InsufficientStock {
                item: ItemName::from(item),
                requested: amount,
                available: offer.stock,
            });
        }
        offer
            .price
            .checked_mul(i64::from(amount))
            .ok_or(WorldError::ArithmeticOverflow)
    }

    /// Remove `amount` units from stock.
    pub fn take(&mut self, item: &str, amount: u32) -> Result<(), WorldError> {
        let offer = self
            .offers
            .get_mut(item)
            .ok_or_else(|| WorldError::NotOffered(ItemName::from(item)))?;
        offer.stock = offer
            .stock
            .checked_sub(amount)
            .ok_or_else(|| WorldError::InsufficientStock {
                item: ItemName::from(item),
                requested: amount,
                available: offer.stock,
            })?;
        Ok(())
    }

    /// Add one unit to every under-stocked offer if `round` is a restock round.
    ///
    /// Returns the number of offers that gained a unit.
    pub fn restock(&mut self, round: u64) -> u32 {
        if round == 0 || round.checked_rem(self.restock_interval) != Some(0) {
            return 0;
        }
        let mut restocked = 0_u32;
        for offer in self.offers.values_mut() {
            if offer.stock < offer.max_stock {
                offer.stock = offer.stock.saturating_add(1);
                restocked = restocked.saturating_add(1);
            }
        }
        restocked
    }

    /// Agent-facing view of the offers.
    pub fn visible_offers(&self) -> BTreeMap<ItemName, ShopOffer> {
        self.offers
            .iter()
            .map(|(name, o)| {
                (
                    name.clone(),
                    ShopOffer {
                        price: o.price,
                        stock: o.stock,
                    },
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shop() -> Shop {
        Shop::new(
            BTreeMap::from([(
                ItemName::from("item0"),
                ShopItem {
                    price: 25,
                    stock: 3,
                    max_stock: 5,
                },
            )]),
            4,
        )
    }

    #[test]
    fn quote_multiplies_price() {
        assert_eq!(shop().quote("item0", 2), Ok(50));
    }

    #[test]
    fn quote_rejects_overdraw_and_unknown() {
        let s = shop();
        assert!(matches!(
            s.quote("item0", 100),
            Err(WorldError::InsufficientStock { available: 3, .. })
        ));
        assert_eq!(
            s.quote("item9", 1),
            Err(WorldError::NotOffered(ItemName::from("item9")))
        );
    }

    #[test]
    fn take_decrements_stock_atomically() {
        let mut s = shop();
        assert!(s.take("item0", 2).is_ok());
        assert_eq!(s.stock("item0"), 1);
        assert!(s.take("item0", 2).is_err());
        assert_eq!(s.stock("item0"), 1);
    }

    #[test]
    fn restock_only_on_interval_and_up_to_max() {
        let mut s = shop();
        assert_eq!(s.restock(3), 0);
        assert_eq!(s.restock(4), 1);
        assert_eq!(s.stock("item0"), 4);
        assert_eq!(s.restock(8), 1);
        assert_eq!(s.restock(12), 0);
        assert_eq!(s.stock("item0"), 5);
    }
}
