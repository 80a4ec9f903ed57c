//! Generated bindings for the deployed bonding curve, its ERC-20 token,
//! and the launchpad factory. The surface mirrors exactly what the
//! platform consumes on-chain.

use ethers::contract::abigen;

abigen!(
    BondingCurve,
    r#"[
        function tokenInfo() external view returns (address, uint256, uint256)
        function quoteAmountOut(uint256, bool) external view returns (uint256, uint256, uint256)
        function swapExactIn(uint256, uint256, bool, address) external payable returns (uint256)
        function tradingEnabled() external view returns (bool)
        function swapFee() external view returns (uint256)
        event Swap(address indexed sender, uint256 amountIn, uint256 amountOut, bool isBuy)
        event TokenPurchase(address indexed buyer, uint256 amount, uint256 price, uint256 timestamp)
        event ReserveUpdate(uint256 reserveToken, uint256 reserveNative)
    ]"#
);

abigen!(
    CurveToken,
    r#"[
        function approve(address, uint256) external returns (bool)
        function allowance(address, address) external view returns (uint256)
        function balanceOf(address) external view returns (uint256)
    ]"#
);

// JSON ABI rather than human-readable: ethers' human-readable parser splits
// parameters on every comma, so it cannot parse the inline tuple argument of
// createLaunchpad.
abigen!(
    LaunchFactory,
    r#"[
        {
            "type": "function",
            "name": "createLaunchpad",
            "stateMutability": "payable",
            "inputs": [
                { "name": "", "type": "uint256" },
                { "name": "", "type": "bool" },
                {
                    "name": "",
                    "type": "tuple",
                    "components": [
                        { "name": "", "type": "string" },
                        { "name": "", "type": "string" },
                        { "name": "", "type": "string" },
                        { "name": "", "type": "address" }
                    ]
                }
            ],
            "outputs": []
        },
        {
            "type": "function",
            "name": "swapFee",
            "stateMutability": "view",
            "inputs": [],
            "outputs": [{ "name": "", "type": "uint256" }]
        },
        {
            "type": "function",
            "name": "BASIS_POINTS",
            "stateMutability": "view",
            "inputs": [],
            "outputs": [{ "name": "", "type": "uint256" }]
        },
        {
            "type": "event",
            "name": "BondingCurveCreated",
            "anonymous": false,
            "inputs": [
                { "name": "bondingCurve", "type": "address", "indexed": false },
                { "name": "token", "type": "address", "indexed": false },
                { "name": "totalSupply", "type": "uint256", "indexed": false },
                { "name": "saleAmount", "type": "uint256", "indexed": false },
                { "name": "endMarketCap", "type": "uint256", "indexed": false },
                { "name": "initMarketCap", "type": "uint256", "indexed": false }
            ]
        }
    ]"#
);
