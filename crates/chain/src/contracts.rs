//! Contract interfaces consumed by the round engine.
//!
//! The distributor holds the reward tokens and one `(root, cid)` pair per
//! round; the wrapper is an ERC-4626-style vault whose share balances set
//! each recipient's pro-rata weight.

use alloy_sol_types::sol;

sol! {
    #[sol(rpc)]
    contract IDistributor {
        function root() external view returns (bytes32);
        function cid() external view returns (string);
        function lastProcessedBlock() external view returns (uint256);
        function getTokens() external view returns (address[]);
        function setMerkleRoot(bytes32 root, string cid) external;
        function claim(address recipient, address token, uint256 amount, bytes32[] proof) external;

        event Claimed(address indexed recipient, address indexed token, uint256 amount);
    }

    #[sol(rpc)]
    contract IWrapper {
        function totalSupply() external view returns (uint256);
        function balanceOf(address account) external view returns (uint256);

        event Deposit(address indexed sender, address indexed owner, uint256 assets, uint256 shares);
    }

    #[sol(rpc)]
    contract IERC20 {
        function balanceOf(address account) external view returns (uint256);
    }
}
