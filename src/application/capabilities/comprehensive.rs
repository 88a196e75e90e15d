//! Market questions: statistics, comparisons, recommendations and general advice

use std::sync::Arc;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex_lite::Regex;

use super::{Capability, CapabilityContext};
use crate::application::errors::ChatError;
use crate::application::formatter::money;
use crate::application::search::query_parser::title_case;
use crate::application::services::ListingService;
use crate::domain::entities::{ListingFilter, Message, Property, Response, TypeStats};

const RECOMMENDATIONS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Topic {
    Statistics,
    Comparison,
    Recommendation,
    Amenities,
    Pricing,
    Location,
    PropertyTypes,
    Timing,
    Contact,
    Legal,
    Financial,
    Maintenance,
}

impl Topic {
    fn query_type(&self) -> &'static str {
        match self {
            Topic::Statistics => "statistics",
            Topic::Comparison => "comparison",
            Topic::Recommendation => "recommendation",
            Topic::Amenities => "amenities",
            Topic::Pricing => "pricing",
            Topic::Location => "location",
            Topic::PropertyTypes => "property_types",
            Topic::Timing => "timing",
            Topic::Contact => "contact",
            Topic::Legal => "legal",
            Topic::Financial => "financial",
            Topic::Maintenance => "maintenance",
        }
    }

    fn failure_text(&self) -> &'static str {
        match self {
            Topic::Statistics => "I'm having trouble retrieving statistics right now. Please try again later.",
            Topic::Comparison => "I'm having trouble comparing properties right now. Please try again later.",
            Topic::Recommendation => {
                "I'm having trouble finding recommendations right now. Please try a specific search instead."
            }
            Topic::Amenities => "I'm having trouble retrieving amenity information. Please try a different question.",
            _ => "I encountered an error while processing your request. Please try rephrasing your question.",
        }
    }
}

// Checked in this order; the first family with a match wins
static TOPICS: Lazy<Vec<(Topic, Vec<Regex>)>> = Lazy::new(|| {
    let table: &[(Topic, &[&str])] = &[
        (Topic::Statistics, &[
            r"how many.*properties", r"what.*average.*price", r"statistics.*properties",
            r"total.*properties", r"price.*range", r"most.*expensive", r"cheapest.*properties",
            r"average.*bedrooms", r"popular.*areas", r"property.*count",
        ]),
        (Topic::Comparison, &[
            r"compare.*properties", r"difference.*between", r"which.*better", r"vs\.", r"versus",
            r"similar.*properties", r"alternative.*properties",
        ]),
        (Topic::Recommendation, &[
            r"recommend.*properties", r"suggest.*properties", r"best.*properties", r"top.*properties",
            r"featured.*properties", r"trending.*properties", r"popular.*properties",
        ]),
        (Topic::Amenities, &[
            r"properties.*with.*wifi", r"properties.*with.*parking", r"properties.*with.*pool",
            r"amenities.*available", r"what.*amenities", r"facilities.*available",
        ]),
        (Topic::Pricing, &[
            r"price.*per.*month", r"rental.*rates", r"buying.*vs.*renting", r"investment.*properties",
            r"return.*on.*investment", r"property.*valuation", r"market.*prices",
        ]),
        (Topic::Location, &[
            r"safe.*areas", r"best.*neighborhoods", r"schools.*nearby", r"transportation.*options",
            r"shopping.*centers", r"hospitals.*nearby", r"crime.*rate",
        ]),
        (Topic::PropertyTypes, &[
            r"house.*vs.*apartment", r"difference.*house.*apartment", r"which.*property.*type",
            r"pros.*cons.*house", r"pros.*cons.*apartment",
        ]),
        (Topic::Timing, &[
            r"when.*best.*time", r"seasonal.*prices", r"market.*trends", r"price.*fluctuations",
            r"busy.*season",
        ]),
        (Topic::Contact, &[
            r"how.*contact.*owner", r"agent.*information", r"viewing.*appointment", r"schedule.*visit",
            r"contact.*details",
        ]),
        (Topic::Legal, &[
            r"legal.*requirements", r"documents.*needed", r"rental.*agreement", r"tenant.*rights",
            r"landlord.*obligations", r"property.*tax",
        ]),
        (Topic::Financial, &[
            r"mortgage.*options", r"financing.*available", r"down.*payment", r"interest.*rates",
            r"loan.*terms", r"payment.*plans",
        ]),
        (Topic::Maintenance, &[
            r"maintenance.*costs", r"utilities.*included", r"repair.*responsibilities",
            r"property.*condition", r"renovation.*costs",
        ]),
    ];

    table
        .iter()
        .map(|(topic, patterns)| (*topic, patterns.iter().map(|p| Regex::new(p).unwrap()).collect()))
        .collect()
});

fn classify(text: &str) -> Option<Topic> {
    TOPICS
        .iter()
        .find(|(_, patterns)| patterns.iter().any(|re| re.is_match(text)))
        .map(|(topic, _)| *topic)
}

const BUY_VS_RENT: &[&str] = &[
    "💰 **Buying vs Renting Comparison:**",
    "",
    "**Buying:**",
    "✅ Pros:",
    "• Build equity over time",
    "• Freedom to customize",
    "• Potential investment returns",
    "• Stable monthly payments",
    "",
    "❌ Cons:",
    "• High upfront costs (down payment, closing costs)",
    "• Maintenance responsibilities",
    "• Less flexibility to move",
    "• Market risk",
    "",
    "**Renting:**",
    "✅ Pros:",
    "• Lower upfront costs",
    "• Flexibility to move",
    "• No maintenance worries",
    "• Predictable monthly costs",
    "",
    "❌ Cons:",
    "• No equity building",
    "• Rent can increase",
    "• Limited customization",
    "• No tax benefits",
    "",
    "**Consider your financial situation, timeline, and lifestyle preferences when deciding!**",
];

const PRICING_GUIDE: &[&str] = &[
    "💰 **Pricing Information:**",
    "",
    "**Rental Properties:**",
    "• Prices vary by location, size, and amenities",
    "• Utilities may or may not be included",
    "• Security deposits are typically required",
    "• Rent is usually paid monthly",
    "",
    "**Properties for Sale:**",
    "• Prices depend on market conditions",
    "• Down payments typically 10-20%",
    "• Closing costs include legal fees and taxes",
    "• Mortgage terms available from banks",
    "",
    "**Market Factors:**",
    "• Location (CBD vs suburbs)",
    "• Property condition and age",
    "• Available amenities",
    "• Market demand and supply",
    "",
    "For specific pricing, try searching for properties in your preferred area!",
];

const LOCATION_GUIDE: &[&str] = &[
    "📍 **Location Information:**",
    "",
    "**Safe Areas:**",
    "• Research crime statistics for specific neighborhoods",
    "• Visit the area at different times",
    "• Talk to local residents",
    "• Check with local police stations",
    "",
    "**Schools & Education:**",
    "• Contact local school districts",
    "• Visit schools in the area",
    "• Check school ratings and performance",
    "• Consider proximity to universities",
    "",
    "**Transportation:**",
    "• Check public transport routes",
    "• Consider traffic patterns",
    "• Look for major highways and roads",
    "• Check parking availability",
    "",
    "**Shopping & Services:**",
    "• Look for nearby shopping centers",
    "• Check for hospitals and clinics",
    "• Find restaurants and entertainment",
    "• Consider proximity to banks and post offices",
    "",
    "For specific area information, try searching for properties in that location!",
];

const PROPERTY_TYPES_GUIDE: &[&str] = &[
    "🏠 **Property Types:**",
    "",
    "**Houses:**",
    "• Standalone properties with private yards",
    "• More space and privacy",
    "• Higher maintenance responsibility",
    "• Usually more expensive",
    "",
    "**Apartments:**",
    "• Units in multi-family buildings",
    "• Shared amenities and facilities",
    "• Lower maintenance responsibility",
    "• Often more affordable",
    "",
    "**Airbnb:**",
    "• Short-term rental properties",
    "• Fully furnished and equipped",
    "• Flexible booking options",
    "• Higher nightly rates",
    "",
    "**Rooms:**",
    "• Individual rooms for rent",
    "• Shared common areas",
    "• Most affordable option",
    "• Less privacy",
    "",
    "**Guesthouses:**",
    "• Small, independent accommodations",
    "• Often in residential areas",
    "• Good for longer stays",
    "• Home-like atmosphere",
];

const TIMING_GUIDE: &[&str] = &[
    "⏰ **Timing Information:**",
    "",
    "**Best Time to Buy/Rent:**",
    "• Market conditions vary throughout the year",
    "• End of year may have more motivated sellers",
    "• Spring/summer often has more inventory",
    "• Consider your personal timeline",
    "",
    "**Seasonal Factors:**",
    "• Prices may fluctuate with seasons",
    "• Weather affects property viewing",
    "• School year affects family moves",
    "• Holiday periods may have limited availability",
    "",
    "**Market Trends:**",
    "• Monitor local market conditions",
    "• Check historical price data",
    "• Consider economic factors",
    "• Consult with real estate professionals",
    "",
    "**Viewing Properties:**",
    "• Schedule viewings during daylight hours",
    "• Visit at different times of day",
    "• Check traffic patterns",
    "• Consider seasonal weather conditions",
];

const CONTACT_GUIDE: &[&str] = &[
    "📞 **Contact Information:**",
    "",
    "**Property Owners:**",
    "• Contact details are available on property listings",
    "• Use the contact form on each property page",
    "• Phone numbers and emails are provided",
    "• Response times vary by owner",
    "",
    "**Scheduling Viewings:**",
    "• Contact the property owner directly",
    "• Arrange convenient viewing times",
    "• Be punctual for appointments",
    "• Ask questions during viewings",
    "",
    "**Tourwise Support:**",
    "• We're here to help with your search",
    "• Use the chat for general questions",
    "• Contact us for technical issues",
    "• We can't arrange viewings directly",
    "",
    "**Tips for Contacting Owners:**",
    "• Be professional and polite",
    "• Have your questions ready",
    "• Mention your timeline and requirements",
    "• Follow up if needed",
];

const LEGAL_GUIDE: &[&str] = &[
    "⚖️ **Legal Information:**",
    "",
    "**Rental Agreements:**",
    "• Written contracts are recommended",
    "• Include rent amount and payment terms",
    "• Specify lease duration and renewal terms",
    "• Detail maintenance responsibilities",
    "",
    "**Required Documents:**",
    "• Proof of income/employment",
    "• References from previous landlords",
    "• Credit check authorization",
    "• Identification documents",
    "",
    "**Tenant Rights:**",
    "• Right to habitable living conditions",
    "• Right to privacy and quiet enjoyment",
    "• Right to request repairs",
    "• Protection from discrimination",
    "",
    "**Landlord Obligations:**",
    "• Maintain habitable conditions",
    "• Make necessary repairs",
    "• Provide proper notice for entry",
    "• Follow eviction procedures",
    "",
    "**Important:** This is general information. Consult with a legal professional for specific advice.",
];

const FINANCIAL_GUIDE: &[&str] = &[
    "💳 **Financial Information:**",
    "",
    "**Mortgage Options:**",
    "• Conventional mortgages available",
    "• Government-backed loans may be available",
    "• Down payments typically 10-20%",
    "• Interest rates vary by lender and credit score",
    "",
    "**Financing Requirements:**",
    "• Good credit score (650+)",
    "• Stable income and employment",
    "• Debt-to-income ratio under 43%",
    "• Sufficient down payment",
    "",
    "**Payment Plans:**",
    "• Monthly mortgage payments",
    "• Property taxes and insurance",
    "• Maintenance and utility costs",
    "• Emergency fund recommended",
    "",
    "**Investment Considerations:**",
    "• Rental income potential",
    "• Property appreciation",
    "• Tax benefits for homeowners",
    "• Market risk and volatility",
    "",
    "**Consult with financial advisors and mortgage lenders for personalized advice.**",
];

const MAINTENANCE_GUIDE: &[&str] = &[
    "🔧 **Maintenance Information:**",
    "",
    "**Rental Properties:**",
    "• Landlords typically handle major repairs",
    "• Tenants may be responsible for minor maintenance",
    "• Check lease agreement for specific terms",
    "• Report issues promptly",
    "",
    "**Owned Properties:**",
    "• Full responsibility for all maintenance",
    "• Regular inspections recommended",
    "• Budget for unexpected repairs",
    "• Consider home warranty options",
    "",
    "**Common Maintenance Costs:**",
    "• HVAC system maintenance",
    "• Plumbing and electrical repairs",
    "• Roof and exterior maintenance",
    "• Landscaping and yard care",
    "",
    "**Utilities:**",
    "• Check what's included in rent",
    "• Budget for electricity, water, gas",
    "• Internet and cable costs",
    "• Trash and recycling services",
    "",
    "**Prevention Tips:**",
    "• Regular inspections and maintenance",
    "• Address issues before they become major problems",
    "• Keep emergency fund for repairs",
    "• Maintain good relationships with contractors",
];

const GENERAL_GUIDE: &[&str] = &[
    "🤔 **I understand you're asking about something specific.**",
    "",
    "Here are some things I can help you with:",
    "",
    "🏠 **Property Search:**",
    "• Find houses, apartments, or other properties",
    "• Search by location, price, or features",
    "• Get property recommendations",
    "",
    "📊 **Market Information:**",
    "• Property statistics and trends",
    "• Price comparisons and analysis",
    "• Market insights and data",
    "",
    "💡 **General Advice:**",
    "• Property buying and renting tips",
    "• Location and neighborhood information",
    "• Financial and legal considerations",
    "",
    "Try asking me something like:",
    "• 'Show me houses in Harare'",
    "• 'What's the average price of apartments?'",
    "• 'Compare houses vs apartments'",
    "• 'What amenities are available?'",
];

fn or_not_available(label: &str, value: Option<String>) -> String {
    format!("• {}: {}", label, value.unwrap_or_else(|| "Not available".to_string()))
}

fn type_block(label: &str, stats: &TypeStats) -> Vec<String> {
    vec![
        format!("**{}:**", label),
        or_not_available("Average price", stats.avg_price.map(|p| money(p, 2))),
        or_not_available("Average bedrooms", stats.avg_bedrooms.map(|b| format!("{:.1}", b))),
        format!("• Available: {}", stats.count),
    ]
}

fn recommendation_card(property: &Property) -> String {
    let price = match property.price {
        Some(p) => format!("💰 {}", money(p, 2)),
        None => "💰 Price on request".to_string(),
    };
    let mut card = format!("🏠 **{}**\n📍 {}, {}\n{}", property.title, property.suburb, property.city, price);
    if let (Some(bed), Some(bath)) = (property.bedrooms, property.bathrooms) {
        card.push_str(&format!("\n🛏️ {} bed, {} bath", bed, bath));
    }
    card
}

pub struct ComprehensiveCapability {
    listings: Arc<ListingService>,
}

impl ComprehensiveCapability {
    pub fn new(listings: Arc<ListingService>) -> Self {
        Self { listings }
    }

    async fn statistics(&self) -> Result<Response, ChatError> {
        let stats = self.listings.store().stats().await?;
        if stats.total == 0 {
            return Ok(Response::conversational("Currently, there are no properties available in our database."));
        }

        let range = match (stats.min_price, stats.max_price) {
            (Some(min), Some(max)) => Some(format!("{} - {}", money(min, 2), money(max, 2))),
            _ => None,
        };

        let mut lines = vec![
            "📊 **Property Statistics:**".to_string(),
            format!("• Total properties: {}", stats.total),
            or_not_available("Average price", stats.avg_price.map(|p| money(p, 2))),
            or_not_available("Price range", range),
            or_not_available("Average bedrooms", stats.avg_bedrooms.map(|b| format!("{:.1}", b))),
        ];

        if !stats.by_type.is_empty() {
            lines.push("\n🏠 **Property Types:**".to_string());
            for (name, count) in stats.by_type.iter().take(3) {
                lines.push(format!("• {}: {}", title_case(name), count));
            }
        }

        if !stats.top_cities.is_empty() {
            lines.push("\n🌍 **Top Cities:**".to_string());
            for (city, count) in stats.top_cities.iter().take(5) {
                lines.push(format!("• {}: {}", title_case(city), count));
            }
        }

        Ok(Response::conversational(lines.join("\n")))
    }

    async fn comparison(&self, text: &str) -> Result<Response, ChatError> {
        if text.contains("house") && text.contains("apartment") {
            let store = self.listings.store();
            let houses = store.type_stats("house").await?;
            let apartments = store.type_stats("apartment").await?;

            let mut lines = vec!["🏠 **House vs Apartment Comparison:**".to_string(), String::new()];
            lines.extend(type_block("Houses", &houses));
            lines.push(String::new());
            lines.extend(type_block("Apartments", &apartments));
            lines.extend(
                [
                    "",
                    "**Key Differences:**",
                    "• Houses typically offer more space and privacy",
                    "• Apartments often have lower maintenance costs",
                    "• Houses may have higher utility costs",
                    "• Apartments often include amenities like gyms/pools",
                ]
                .iter()
                .map(|s| s.to_string()),
            );
            return Ok(Response::conversational(lines.join("\n")));
        }

        if text.contains("buy") && text.contains("rent") {
            return Ok(Response::conversational(BUY_VS_RENT.join("\n")));
        }

        Ok(Response::conversational(
            "I can help you compare different property types, buying vs renting, or specific properties. What would you like to compare?",
        ))
    }

    async fn recommendations(&self) -> Result<Response, ChatError> {
        let store = self.listings.store();
        let mut picks = store.featured(RECOMMENDATIONS).await?;
        if picks.is_empty() {
            picks = store.search(&ListingFilter::new(RECOMMENDATIONS)).await?;
        }
        if picks.is_empty() {
            return Ok(Response::conversational(
                "I don't have any properties to recommend at the moment. Please check back later!",
            ));
        }

        let mut lines = vec!["⭐ **Recommended Properties:**".to_string(), String::new()];
        lines.extend(picks.iter().map(recommendation_card));
        lines.push("\nThese are some of our top picks! Would you like me to search for specific criteria?".to_string());
        Ok(Response::conversational(lines.join("\n")))
    }

    async fn amenities(&self) -> Result<Response, ChatError> {
        let names = self.listings.store().list_amenities().await?;
        if names.is_empty() {
            return Ok(Response::conversational(
                "I don't have information about specific amenities at the moment. You can ask about properties in general!",
            ));
        }

        let mut lines = vec!["🏠 **Available Amenities:**".to_string(), String::new()];
        lines.extend(names.iter().map(|n| format!("• {}", n)));
        lines.push(
            "\nYou can search for properties with specific amenities by saying something like 'properties with wifi' or 'houses with parking'."
                .to_string(),
        );
        Ok(Response::conversational(lines.join("\n")))
    }

    async fn answer(&self, topic: Topic, text: &str) -> Result<Response, ChatError> {
        let guide = match topic {
            Topic::Statistics => return self.statistics().await,
            Topic::Comparison => return self.comparison(text).await,
            Topic::Recommendation => return self.recommendations().await,
            Topic::Amenities => return self.amenities().await,
            Topic::Pricing => PRICING_GUIDE,
            Topic::Location => LOCATION_GUIDE,
            Topic::PropertyTypes => PROPERTY_TYPES_GUIDE,
            Topic::Timing => TIMING_GUIDE,
            Topic::Contact => CONTACT_GUIDE,
            Topic::Legal => LEGAL_GUIDE,
            Topic::Financial => FINANCIAL_GUIDE,
            Topic::Maintenance => MAINTENANCE_GUIDE,
        };
        Ok(Response::conversational(guide.join("\n")))
    }
}

#[async_trait]
impl Capability for ComprehensiveCapability {
    fn name(&self) -> &str {
        "ComprehensiveHandler"
    }

    fn description(&self) -> &str {
        "Handles statistics, comparisons, recommendations, and other complex queries"
    }

    fn priority(&self) -> i32 {
        40
    }

    fn can_handle(&self, message: &Message, _ctx: &CapabilityContext) -> bool {
        classify(&message.normalized()).is_some()
    }

    async fn process(&self, message: &Message, _ctx: &mut CapabilityContext) -> Result<Response, ChatError> {
        let text = message.normalized();
        let Some(topic) = classify(&text) else {
            return Ok(Response::conversational(GENERAL_GUIDE.join("\n")).with_metadata("query_type", "general"));
        };

        match self.answer(topic, &text).await {
            Ok(response) => Ok(response.with_metadata("query_type", topic.query_type())),
            Err(e) => {
                tracing::error!("{} query failed: {}", topic.query_type(), e);
                Ok(Response::error(topic.failure_text(), e.to_string()))
            }
        }
    }
}
