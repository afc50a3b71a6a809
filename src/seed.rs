//! Resets the store to a known state: two accounts and the starter catalogue.

use std::str::FromStr;

use bigdecimal::BigDecimal;
use diesel::prelude::*;
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::errors::DomainError;
use crate::domain::user::Role;
use crate::infrastructure::models::{NewProductRow, NewUserRow};
use crate::schema::{products, users};

struct SeedUser {
    name: &'static str,
    email: &'static str,
    password: &'static str,
    role: Role,
}

struct SeedProduct {
    name: &'static str,
    description: &'static str,
    price: &'static str,
    category: &'static str,
    image_url: &'static str,
    stock: i32,
}

const ACCOUNTS: [SeedUser; 2] = [
    SeedUser {
        name: "Admin",
        email: "admin@gmail.com",
        password: "123",
        role: Role::Admin,
    },
    SeedUser {
        name: "Sharad",
        email: "sharad@gmail.com",
        password: "123",
        role: Role::User,
    },
];

const CATALOGUE: [SeedProduct; 20] = [
    SeedProduct {
        name: "Acrylic Paint Set",
        description: "Professional 12-color acrylic paint set, perfect for canvas painting",
        price: "24.99",
        category: "Painting",
        image_url: "/uploads/acrylic-paint.jpg",
        stock: 50,
    },
    SeedProduct {
        name: "Sketch Book",
        description: "A4 size, 100 pages, suitable for pencil and charcoal sketching",
        price: "9.99",
        category: "Drawing",
        image_url: "/uploads/sketch-book.jpg",
        stock: 100,
    },
    SeedProduct {
        name: "Brush Set",
        description: "Set of 10 different size brushes for watercolor and acrylic painting",
        price: "15.99",
        category: "Painting",
        image_url: "/uploads/brush-set.jpg",
        stock: 30,
    },
    SeedProduct {
        name: "Colored Pencils",
        description: "24 premium colored pencils for professional artists",
        price: "19.99",
        category: "Drawing",
        image_url: "/uploads/colored-pencils.jpg",
        stock: 45,
    },
    SeedProduct {
        name: "Clay Set",
        description: "Modeling clay set with tools, perfect for sculpture",
        price: "29.99",
        category: "Sculpture",
        image_url: "/uploads/clay-set.jpg",
        stock: 25,
    },
    SeedProduct {
        name: "Watercolor Paint Palette",
        description: "Premium watercolor paint set with 24 vibrant colors",
        price: "32.50",
        category: "Painting",
        image_url: "/uploads/watercolor-palette.jpg",
        stock: 40,
    },
    SeedProduct {
        name: "Craft Scissors",
        description: "Precision craft scissors for paper and fabric cutting",
        price: "7.99",
        category: "Tools",
        image_url: "/uploads/craft-scissors.jpg",
        stock: 60,
    },
    SeedProduct {
        name: "Glue Gun",
        description: "Mini hot glue gun with 20 glue sticks included",
        price: "14.99",
        category: "Tools",
        image_url: "/uploads/glue-gun.jpg",
        stock: 35,
    },
    SeedProduct {
        name: "Craft Knife",
        description: "Precision knife set with 5 replaceable blades",
        price: "11.50",
        category: "Tools",
        image_url: "/uploads/craft-knife.jpg",
        stock: 40,
    },
    SeedProduct {
        name: "Cutting Mat",
        description: "A3 size self-healing cutting mat with grid lines",
        price: "17.99",
        category: "Tools",
        image_url: "/uploads/cutting-mat.jpg",
        stock: 28,
    },
    SeedProduct {
        name: "Glitter Pack",
        description: "Assorted 12-color fine glitter jars for decoration",
        price: "8.50",
        category: "Decoration",
        image_url: "/uploads/glitter-pack.jpg",
        stock: 75,
    },
    SeedProduct {
        name: "Sequins Pack",
        description: "Mixed shape sequins pack for crafts and scrapbooking",
        price: "5.99",
        category: "Decoration",
        image_url: "/uploads/sequins-pack.jpg",
        stock: 90,
    },
    SeedProduct {
        name: "Markers Set",
        description: "Dual-tip alcohol markers set of 36 vibrant colors",
        price: "39.99",
        category: "Drawing",
        image_url: "/uploads/markers-set.jpg",
        stock: 20,
    },
    SeedProduct {
        name: "Fine Liners",
        description: "Pack of 10 waterproof fine liner pens, 0.1mm to 0.8mm",
        price: "12.99",
        category: "Drawing",
        image_url: "/uploads/fine-liners.jpg",
        stock: 55,
    },
    SeedProduct {
        name: "Craft Paper Pack",
        description: "50-sheet assorted craft paper pack, patterned and plain",
        price: "10.99",
        category: "Paper Crafts",
        image_url: "/uploads/craft-paper.jpg",
        stock: 70,
    },
    SeedProduct {
        name: "Washi Tape Set",
        description: "Set of 20 decorative washi tapes for journaling and crafts",
        price: "13.99",
        category: "Decoration",
        image_url: "/uploads/washi-tape.jpg",
        stock: 42,
    },
    SeedProduct {
        name: "Air-Dry Clay",
        description: "500g air-dry clay, safe and non-toxic, ideal for beginners",
        price: "9.99",
        category: "Sculpture",
        image_url: "/uploads/air-dry-clay.jpg",
        stock: 65,
    },
    SeedProduct {
        name: "DIY Candle Kit",
        description: "Complete candle making kit with wax, wicks, and dyes",
        price: "27.99",
        category: "DIY Kits",
        image_url: "/uploads/diy-candle-kit.jpg",
        stock: 18,
    },
    SeedProduct {
        name: "DIY Jewelry Kit",
        description: "Starter kit with beads, wires, and tools for making jewelry",
        price: "22.99",
        category: "DIY Kits",
        image_url: "/uploads/diy-jewelry-kit.jpg",
        stock: 30,
    },
    SeedProduct {
        name: "DIY Scrapbook Kit",
        description: "Complete scrapbook set with stickers, paper, and embellishments",
        price: "19.50",
        category: "DIY Kits",
        image_url: "/uploads/diy-scrapbook-kit.jpg",
        stock: 26,
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedReport {
    pub users: usize,
    pub products: usize,
}

/// Clears users and products and inserts the seed data in one transaction.
/// Orders are left alone.
pub fn run(pool: &DbPool, hash_cost: u32) -> Result<SeedReport, DomainError> {
    let accounts = ACCOUNTS
        .iter()
        .map(|a| {
            let password_hash = bcrypt::hash(a.password, hash_cost)
                .map_err(|e| DomainError::Internal(format!("password hashing failed: {}", e)))?;
            Ok(NewUserRow {
                id: Uuid::new_v4(),
                name: a.name.to_string(),
                email: a.email.to_string(),
                password_hash,
                role: a.role.as_str().to_string(),
            })
        })
        .collect::<Result<Vec<_>, DomainError>>()?;

    let catalogue = CATALOGUE
        .iter()
        .map(|p| {
            let price = BigDecimal::from_str(p.price)
                .map_err(|e| DomainError::Internal(format!("bad seed price {}: {}", p.price, e)))?;
            Ok(NewProductRow {
                id: Uuid::new_v4(),
                name: p.name.to_string(),
                description: p.description.to_string(),
                price,
                category: p.category.to_string(),
                image_url: p.image_url.to_string(),
                stock: p.stock,
            })
        })
        .collect::<Result<Vec<_>, DomainError>>()?;

    let mut conn = pool.get()?;
    conn.transaction::<_, DomainError, _>(|conn| {
        diesel::delete(users::table).execute(conn)?;
        diesel::delete(products::table).execute(conn)?;

        let user_count = diesel::insert_into(users::table)
            .values(&accounts)
            .execute(conn)?;
        let product_count = diesel::insert_into(products::table)
            .values(&catalogue)
            .execute(conn)?;

        log::info!("Seeded {} users and {} products", user_count, product_count);
        Ok(SeedReport {
            users: user_count,
            products: product_count,
        })
    })
}
